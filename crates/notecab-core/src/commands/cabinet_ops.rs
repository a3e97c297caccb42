use std::io::Write;

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  info,
  instrument
};

use super::Session;
use crate::dialogs::{
  CreateCabinetDialog,
  DeleteCabinetDialog
};

pub(super) fn cmd_cabinets(
  session: &Session,
  out: &mut dyn Write
) -> anyhow::Result<()> {
  let cabinets =
    session.cabinets.cabinets();
  if cabinets.is_empty() {
    writeln!(out, "No cabinets.")?;
    return Ok(());
  }
  session.renderer.cabinet_table(
    out,
    &cabinets,
    session.cabinets.current_cabinet_id()
  )
}

#[instrument(skip(session, out))]
pub(super) async fn cmd_cabinet_add(
  session: &Session,
  out: &mut dyn Write,
  name: &str
) -> anyhow::Result<()> {
  let mut dialog =
    CreateCabinetDialog::new();
  dialog.open();
  dialog.set_name(name);

  let Some(cabinet) =
    dialog.submit(&session.cabinets).await
  else {
    return Err(anyhow!(
      "{}",
      dialog
        .error()
        .unwrap_or("failed to create cabinet")
    ));
  };

  info!(id = %cabinet.id, "command cabinet-add");
  writeln!(
    out,
    "Created cabinet '{}'.",
    cabinet.name
  )?;
  Ok(())
}

#[instrument(skip(session, out))]
pub(super) async fn cmd_cabinet_rm(
  session: &Session,
  out: &mut dyn Write,
  key: &str
) -> anyhow::Result<()> {
  let cabinet = session
    .cabinets
    .find_by_name_or_id(key)
    .ok_or_else(|| {
      anyhow!("no cabinet named {key}")
    })?;

  let mut dialog =
    DeleteCabinetDialog::new();
  dialog.open(cabinet.clone());
  if !dialog.confirm(&session.cabinets).await
  {
    return Err(anyhow!(
      "{}",
      dialog
        .error()
        .unwrap_or("failed to delete cabinet")
    ));
  }

  writeln!(
    out,
    "Deleted cabinet '{}'.",
    cabinet.name
  )?;
  match session.cabinets.current_cabinet() {
    | Some(current) => writeln!(
      out,
      "Now using '{}'.",
      current.name
    )?,
    | None => {
      writeln!(out, "No cabinets left.")?
    }
  }
  Ok(())
}

#[instrument(skip(session, out))]
pub(super) async fn cmd_use(
  session: &Session,
  out: &mut dyn Write,
  key: &str
) -> anyhow::Result<()> {
  let cabinet = session
    .cabinets
    .find_by_name_or_id(key)
    .ok_or_else(|| {
      anyhow!("no cabinet named {key}")
    })?;
  session
    .cabinets
    .select_cabinet(cabinet.id)
    .await
    .with_context(|| {
      format!(
        "failed to switch to {}",
        cabinet.name
      )
    })?;
  writeln!(
    out,
    "Now using '{}' ({} notes).",
    cabinet.name,
    session.cabinets.notes().len()
  )?;
  Ok(())
}
