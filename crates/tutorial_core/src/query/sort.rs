use super::field::TutorialField;
use super::{QueryError, QueryResult};
use once_cell::sync::Lazy;
use regex::Regex;

static SORT_SEGMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_]+)\s*(?:,\s*([A-Za-z]+)\s*)?$").expect("valid sort segment regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    fn parse(value: &str) -> QueryResult<Self> {
        if value.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if value.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(QueryError::InvalidQuery(format!(
                "unknown sort direction `{value}`; expected asc|desc"
            )))
        }
    }
}

/// One ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub field: TutorialField,
    pub direction: Direction,
}

/// Caller-supplied ordering, applied left to right.
///
/// Every rendered ordering ends with `id ASC` unless `id` is already a key,
/// which keeps results and page boundaries deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(field: TutorialField, direction: Direction) -> Self {
        Self::unsorted().then(field, direction)
    }

    pub fn asc(field: TutorialField) -> Self {
        Self::by(field, Direction::Asc)
    }

    pub fn desc(field: TutorialField) -> Self {
        Self::by(field, Direction::Desc)
    }

    pub fn then(mut self, field: TutorialField, direction: Direction) -> Self {
        self.orders.push(Order { field, direction });
        self
    }

    /// Parses `field[,asc|desc]` segments separated by `;`,
    /// e.g. `level,desc;createdAt`. Fields resolve against the tutorial
    /// whitelist; anything else is rejected before a query is built.
    pub fn parse(spec: &str) -> QueryResult<Self> {
        let mut sort = Self::unsorted();
        for segment in spec.split(';').filter(|segment| !segment.trim().is_empty()) {
            let captures = SORT_SEGMENT_RE.captures(segment).ok_or_else(|| {
                QueryError::InvalidQuery(format!("malformed sort segment `{}`", segment.trim()))
            })?;
            let field = captures[1].parse::<TutorialField>()?;
            let direction = match captures.get(2) {
                Some(direction) => Direction::parse(direction.as_str())?,
                None => Direction::Asc,
            };
            sort = sort.then(field, direction);
        }
        Ok(sort)
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Renders an `ORDER BY` clause from whitelisted columns.
    pub(crate) fn order_by_clause(&self) -> String {
        let mut keys: Vec<String> = self
            .orders
            .iter()
            .map(|order| format!("{} {}", order.field.column(), order.direction.keyword()))
            .collect();
        if !self
            .orders
            .iter()
            .any(|order| order.field == TutorialField::Id)
        {
            keys.push("id ASC".to_string());
        }
        format!(" ORDER BY {}", keys.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsorted_falls_back_to_insertion_order() {
        assert_eq!(Sort::unsorted().order_by_clause(), " ORDER BY id ASC");
    }

    #[test]
    fn chained_orders_keep_id_tiebreaker() {
        let sort = Sort::desc(TutorialField::Level).then(TutorialField::CreatedAt, Direction::Asc);
        assert_eq!(
            sort.order_by_clause(),
            " ORDER BY level DESC, created_at ASC, id ASC"
        );
    }

    #[test]
    fn explicit_id_key_is_not_duplicated() {
        assert_eq!(
            Sort::desc(TutorialField::Id).order_by_clause(),
            " ORDER BY id DESC"
        );
    }

    #[test]
    fn parse_accepts_attribute_names_and_default_direction() {
        let sort = Sort::parse("level,DESC; createdAt").unwrap();
        assert_eq!(
            sort.orders(),
            &[
                Order {
                    field: TutorialField::Level,
                    direction: Direction::Desc
                },
                Order {
                    field: TutorialField::CreatedAt,
                    direction: Direction::Asc
                },
            ]
        );
        assert!(Sort::parse("  ").unwrap().is_unsorted());
    }

    #[test]
    fn parse_rejects_unknown_fields_and_injection_attempts() {
        assert!(matches!(
            Sort::parse("rating,desc"),
            Err(QueryError::InvalidQuery(_))
        ));
        assert!(matches!(
            Sort::parse("level desc, (SELECT 1)"),
            Err(QueryError::InvalidQuery(_))
        ));
        assert!(matches!(
            Sort::parse("level,sideways"),
            Err(QueryError::InvalidQuery(_))
        ));
    }
}
