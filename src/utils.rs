use chrono::NaiveDate;
use uuid::Uuid;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Parses a ledger date. Accepts `YYYY-MM-DD` (and `/` or `.` separators) with an
/// optional time suffix such as `2024-03-01T00:00:00Z`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Stable sort by date. Items whose date does not parse keep their index; the
/// dated items are sorted among the remaining positions.
pub fn sort_by_date<T, F>(items: &mut Vec<T>, date_of: F, order: SortOrder)
where
    F: Fn(&T) -> Option<NaiveDate>,
{
    let original = std::mem::take(items);
    let mut slots: Vec<Option<T>> = Vec::with_capacity(original.len());
    let mut dated: Vec<(NaiveDate, T)> = Vec::new();
    let mut dated_positions = Vec::new();

    for (idx, item) in original.into_iter().enumerate() {
        match date_of(&item) {
            Some(date) => {
                dated_positions.push(idx);
                dated.push((date, item));
                slots.push(None);
            }
            None => slots.push(Some(item)),
        }
    }

    match order {
        SortOrder::Ascending => dated.sort_by(|a, b| a.0.cmp(&b.0)),
        SortOrder::Descending => dated.sort_by(|a, b| b.0.cmp(&a.0)),
    }

    for (pos, (_, item)) in dated_positions.into_iter().zip(dated) {
        slots[pos] = Some(item);
    }

    items.extend(slots.into_iter().flatten());
}

/// Returns a random v4 UUID for which `is_taken` is false.
pub fn fresh_id<F>(is_taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    loop {
        let id = Uuid::new_v4().to_string();
        if !is_taken(&id) {
            return id;
        }
    }
}

/// Short id prefix used when encoding transactions into prompts.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
