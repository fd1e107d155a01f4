use rusqlite::Connection;
use std::collections::HashSet;
use tutorial_core::db::open_db_in_memory;
use tutorial_core::{
    Direction, NewTutorial, RepoError, Sort, SqliteTutorialStore, Tutorial, TutorialField,
    TutorialId, TutorialService,
};

type Service<'conn> = TutorialService<SqliteTutorialStore<'conn>>;

fn service(conn: &mut Connection) -> Service<'_> {
    TutorialService::new(SqliteTutorialStore::try_new(conn).unwrap())
}

fn seed(service: &Service<'_>, title: &str, level: i32, created_at: i64, published: bool) -> Tutorial {
    service
        .insert(
            &NewTutorial::new(title, format!("{title} description"), level)
                .created_at(created_at)
                .published(published),
        )
        .unwrap()
}

fn titles(tutorials: &[Tutorial]) -> Vec<&str> {
    tutorials.iter().map(|t| t.title.as_str()).collect()
}

fn ids(tutorials: &[Tutorial]) -> HashSet<TutorialId> {
    tutorials.iter().map(|t| t.id).collect()
}

#[test]
fn find_all_returns_every_tutorial_in_insertion_order() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service(&mut conn);
    let first = seed(&service, "Zig for Rustaceans", 2, 1_000, false);
    let second = seed(&service, "Async Rust", 3, 2_000, true);
    let third = seed(&service, "Cargo Workspaces", 1, 3_000, false);

    let all = service.find_all().unwrap();
    assert_eq!(all, vec![first, second, third]);
}

#[test]
fn find_all_on_empty_store_is_empty() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service(&mut conn);
    assert!(service.find_all().unwrap().is_empty());
}

#[test]
fn published_filters_partition_the_catalog() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service(&mut conn);
    seed(&service, "A", 1, 1_000, true);
    seed(&service, "B", 2, 2_000, false);
    seed(&service, "C", 3, 3_000, true);
    seed(&service, "D", 4, 4_000, false);

    let published = service.find_by_published(true).unwrap();
    let drafts = service.find_by_published(false).unwrap();
    assert!(published.iter().all(|t| t.published));
    assert!(drafts.iter().all(|t| !t.published));

    let published_ids = ids(&published);
    let draft_ids = ids(&drafts);
    assert!(published_ids.is_disjoint(&draft_ids));
    let union: HashSet<_> = published_ids.union(&draft_ids).copied().collect();
    assert_eq!(union, ids(&service.find_all().unwrap()));
}

#[test]
fn title_substring_respects_case_mode() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service(&mut conn);
    seed(&service, "Abstract Syntax Trees", 2, 1_000, false);
    seed(&service, "Macros", 3, 2_000, false);

    assert_eq!(
        titles(&service.find_by_title_like_case_insensitive("AB").unwrap()),
        vec!["Abstract Syntax Trees"]
    );
    assert_eq!(
        titles(&service.find_by_title_like_case_insensitive("ab").unwrap()),
        vec!["Abstract Syntax Trees"]
    );
    assert_eq!(
        titles(&service.find_by_title_like("Abs").unwrap()),
        vec!["Abstract Syntax Trees"]
    );
    assert!(service.find_by_title_like("abs").unwrap().is_empty());
    assert!(service
        .find_by_title_like_case_insensitive("ownership")
        .unwrap()
        .is_empty());
}

#[test]
fn title_substring_treats_like_wildcards_literally() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service(&mut conn);
    seed(&service, "100% Safe Rust", 1, 1_000, false);
    seed(&service, "Unsafe Rust", 2, 2_000, false);

    assert_eq!(
        titles(&service.find_by_title_like("%").unwrap()),
        vec!["100% Safe Rust"]
    );
    assert!(service.find_by_title_like("_nsafe_").unwrap().is_empty());
}

#[test]
fn empty_substring_matches_everything() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service(&mut conn);
    seed(&service, "One", 1, 1_000, false);
    seed(&service, "Two", 2, 2_000, true);

    assert_eq!(service.find_by_title_like("").unwrap().len(), 2);
}

#[test]
fn level_and_date_thresholds_are_inclusive() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service(&mut conn);
    seed(&service, "L1", 1, 1_000, false);
    seed(&service, "L2", 2, 2_000, false);
    seed(&service, "L3", 3, 3_000, false);

    assert_eq!(
        titles(&service.find_by_level_greater_than_equal(2).unwrap()),
        vec!["L2", "L3"]
    );
    assert_eq!(
        titles(&service.find_by_date_greater_than_equal(3_000).unwrap()),
        vec!["L3"]
    );
    assert!(service
        .find_by_date_greater_than_equal(3_001)
        .unwrap()
        .is_empty());
}

#[test]
fn range_filters_include_both_bounds() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service(&mut conn);
    for level in 1..=5 {
        seed(&service, &format!("L{level}"), level, i64::from(level) * 1_000, false);
    }

    assert_eq!(
        titles(&service.find_by_level_between(2, 4).unwrap()),
        vec!["L2", "L3", "L4"]
    );
    assert_eq!(
        titles(&service.find_by_date_between(1_000, 2_000).unwrap()),
        vec!["L1", "L2"]
    );
    assert_eq!(
        titles(&service.find_by_level_between(3, 3).unwrap()),
        vec!["L3"]
    );
}

#[test]
fn reversed_range_is_rejected_before_execution() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service(&mut conn);
    seed(&service, "L1", 1, 1_000, false);

    let err = service.find_by_level_between(4, 2).unwrap_err();
    assert!(matches!(
        err,
        RepoError::InvalidRange {
            field: TutorialField::Level,
            ..
        }
    ));

    let err = service.find_by_date_between(5_000, 1_000).unwrap_err();
    assert!(matches!(
        err,
        RepoError::InvalidRange {
            field: TutorialField::CreatedAt,
            ..
        }
    ));

    let err = service
        .find_by_level_between_and_published(3, 1, true)
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidRange { .. }));
}

#[test]
fn published_and_level_range_combine_with_and() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service(&mut conn);
    seed(&service, "P1", 1, 1_000, true);
    seed(&service, "P3", 3, 2_000, true);
    seed(&service, "D2", 2, 3_000, false);
    seed(&service, "P5", 5, 4_000, true);

    assert_eq!(
        titles(&service.find_by_level_between_and_published(1, 3, true).unwrap()),
        vec!["P1", "P3"]
    );
    assert_eq!(
        titles(&service.find_by_level_between_and_published(1, 3, false).unwrap()),
        vec!["D2"]
    );
}

#[test]
fn keyword_matches_title_or_description() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service(&mut conn);
    service
        .insert(&NewTutorial::new("Error Handling", "Result and the ? operator", 2))
        .unwrap();
    service
        .insert(&NewTutorial::new("RESULT types", "enums everywhere", 1))
        .unwrap();
    service
        .insert(&NewTutorial::new("Iterators", "adapters and closures", 2))
        .unwrap();

    assert_eq!(
        titles(
            &service
                .find_by_title_or_description_containing_case_insensitive("result")
                .unwrap()
        ),
        vec!["Error Handling", "RESULT types"]
    );
}

#[test]
fn title_and_published_combine_with_and() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service(&mut conn);
    seed(&service, "Rust Traits", 2, 1_000, true);
    seed(&service, "Rust Generics", 2, 2_000, false);
    seed(&service, "Go Interfaces", 2, 3_000, true);

    assert_eq!(
        titles(
            &service
                .find_by_title_containing_case_insensitive_and_published("rust", true)
                .unwrap()
        ),
        vec!["Rust Traits"]
    );
}

#[test]
fn level_descending_order() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service(&mut conn);
    seed(&service, "one", 1, 1_000, false);
    seed(&service, "three", 3, 2_000, false);
    seed(&service, "two", 2, 3_000, false);

    let levels: Vec<i32> = service
        .find_all_order_by_level_desc()
        .unwrap()
        .iter()
        .map(|t| t.level)
        .collect();
    assert_eq!(levels, vec![3, 2, 1]);
}

#[test]
fn filtered_level_ascending_order() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service(&mut conn);
    seed(&service, "Rust advanced", 3, 1_000, false);
    seed(&service, "Python", 1, 2_000, false);
    seed(&service, "rust basics", 1, 3_000, false);

    assert_eq!(
        titles(&service.find_by_title_order_by_level_asc("RUST").unwrap()),
        vec!["rust basics", "Rust advanced"]
    );
}

#[test]
fn published_newest_first() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service(&mut conn);
    seed(&service, "old", 1, 1_000, true);
    seed(&service, "draft", 1, 5_000, false);
    seed(&service, "new", 1, 3_000, true);

    assert_eq!(
        titles(&service.find_all_published_order_by_created_desc().unwrap()),
        vec!["new", "old"]
    );
}

#[test]
fn caller_supplied_sort_applies_keys_in_order() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service(&mut conn);
    seed(&service, "Rust A", 2, 3_000, true);
    seed(&service, "Rust B", 1, 1_000, false);
    seed(&service, "Rust C", 2, 2_000, true);
    seed(&service, "Other", 9, 4_000, true);

    let by_level_then_date = Sort::asc(TutorialField::Level).then(TutorialField::CreatedAt, Direction::Desc);
    assert_eq!(
        titles(&service.find_by_title_and_sort("rust", &by_level_then_date).unwrap()),
        vec!["Rust B", "Rust A", "Rust C"]
    );

    let parsed = Sort::parse("createdAt,asc").unwrap();
    assert_eq!(
        titles(&service.find_by_published_and_sort(true, &parsed).unwrap()),
        vec!["Rust C", "Rust A", "Other"]
    );
}

#[test]
fn unknown_sort_field_fails_before_reaching_storage() {
    let err = Sort::parse("popularity,desc").unwrap_err();
    let err = RepoError::from(err);
    assert!(matches!(err, RepoError::InvalidQuery(_)));
}

#[test]
fn publish_flips_flag_and_reports_affected_rows() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = service(&mut conn);
    let draft = seed(&service, "Draft", 1, 1_000, false);

    assert_eq!(service.publish_tutorial(draft.id).unwrap(), 1);
    assert!(service.find_by_id(draft.id).unwrap().unwrap().published);

    assert_eq!(service.publish_tutorial(draft.id).unwrap(), 1);
    assert!(service.find_by_id(draft.id).unwrap().unwrap().published);
}

#[test]
fn publish_missing_id_affects_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = service(&mut conn);
    let draft = seed(&service, "Draft", 1, 1_000, false);
    let before = service.find_all().unwrap();

    assert_eq!(service.publish_tutorial(TutorialId(draft.id.0 + 100)).unwrap(), 0);
    assert_eq!(service.find_all().unwrap(), before);
}

#[test]
fn end_to_end_java_catalog() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = service(&mut conn);
    let basics = service
        .insert_with_id(TutorialId(1), &NewTutorial::new("Java Basics", "", 1))
        .unwrap();
    let advanced = service
        .insert_with_id(
            TutorialId(2),
            &NewTutorial::new("Advanced Java", "", 3).published(true),
        )
        .unwrap();

    let found = service.find_by_title_like_case_insensitive("java").unwrap();
    assert_eq!(ids(&found), ids(&[basics.clone(), advanced.clone()]));

    assert_eq!(service.publish_tutorial(TutorialId(1)).unwrap(), 1);
    let published = service.find_by_published(true).unwrap();
    assert_eq!(ids(&published), ids(&[basics, advanced]));
}
