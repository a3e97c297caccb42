use chrono::{
  Datelike,
  Duration,
  Months,
  NaiveDate
};
use notecab_shared::CalendarViewMode;

/// Direction of a calendar navigation
/// step.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum Step {
  Previous,
  Next
}

/// Sunday on or before `date`.
pub fn week_start(
  date: NaiveDate
) -> NaiveDate {
  date
    - Duration::days(i64::from(
      date.weekday().num_days_from_sunday()
    ))
}

pub fn week_dates(
  date: NaiveDate
) -> [NaiveDate; 7] {
  let start = week_start(date);
  std::array::from_fn(|offset| {
    start + Duration::days(offset as i64)
  })
}

fn first_of_month(
  date: NaiveDate
) -> NaiveDate {
  date.with_day(1).unwrap_or(date)
}

/// Sunday-first rows covering the month
/// of `date`; cells outside the month are
/// `None`.
pub fn month_grid(
  date: NaiveDate
) -> Vec<[Option<NaiveDate>; 7]> {
  let first = first_of_month(date);
  let lead = first
    .weekday()
    .num_days_from_sunday()
    as usize;

  let mut cells: Vec<Option<NaiveDate>> =
    vec![None; lead];
  let mut day = first;
  while day.month() == first.month() {
    cells.push(Some(day));
    match day.succ_opt() {
      | Some(next) => day = next,
      | None => break
    }
  }
  while cells.len() % 7 != 0 {
    cells.push(None);
  }

  cells
    .chunks(7)
    .map(|row| {
      std::array::from_fn(|idx| row[idx])
    })
    .collect()
}

/// Week-of-month shown in week labels:
/// `ceil((start.day + weekday(first of
/// month)) / 7)`, with the week start
/// taken from `date`'s Sunday and the
/// first of month from `date`'s month.
pub fn week_of_month(
  date: NaiveDate
) -> u32 {
  let start = week_start(date);
  let lead = first_of_month(date)
    .weekday()
    .num_days_from_sunday();
  (start.day() + lead).div_ceil(7)
}

/// Moves `date` one period in `step`'s
/// direction. Months clamp the day to the
/// target month's length.
pub fn shift(
  mode: CalendarViewMode,
  date: NaiveDate,
  step: Step
) -> NaiveDate {
  match (mode, step) {
    | (
      CalendarViewMode::Month,
      Step::Next
    ) => date
      .checked_add_months(Months::new(1))
      .unwrap_or(date),
    | (
      CalendarViewMode::Month,
      Step::Previous
    ) => date
      .checked_sub_months(Months::new(1))
      .unwrap_or(date),
    | (
      CalendarViewMode::Week,
      Step::Next
    ) => date + Duration::days(7),
    | (
      CalendarViewMode::Week,
      Step::Previous
    ) => date - Duration::days(7)
  }
}

pub fn period_label(
  mode: CalendarViewMode,
  date: NaiveDate
) -> String {
  match mode {
    | CalendarViewMode::Month => {
      date.format("%B %Y").to_string()
    }
    | CalendarViewMode::Week => {
      let start = week_start(date);
      let end = start + Duration::days(6);
      format!(
        "W{} < {} - {} >",
        week_of_month(date),
        start.format("%b %-d"),
        end.format("%b %-d, %Y")
      )
    }
  }
}
