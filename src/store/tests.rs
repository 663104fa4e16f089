use std::collections::HashSet;

use rusqlite::Connection;

use super::*;
use crate::error::IngestError;
use crate::model::{ElementKind, SectionSeed};

fn store_with_subsection(section: u32, subsection: u32) -> (Connection, i64) {
    let mut connection = open_in_memory().expect("in-memory store should open");
    let subsection_id = {
        let tx = connection.transaction().expect("transaction should start");
        seed_section(
            &tx,
            &SectionSeed {
                number: section,
                title: "Probability".to_string(),
            },
        )
        .expect("section should seed");
        let upsert = upsert_subsection(&tx, section, subsection, "Sample Spaces")
            .expect("subsection should insert");
        tx.commit().expect("commit should succeed");
        upsert.id
    };
    (connection, subsection_id)
}

#[test]
fn seeding_is_idempotent() {
    let mut connection = open_in_memory().expect("in-memory store should open");
    let seed = SectionSeed {
        number: 1,
        title: "Probability".to_string(),
    };

    let tx = connection.transaction().expect("transaction should start");
    assert!(seed_section(&tx, &seed).expect("first seed"));
    assert!(!seed_section(&tx, &seed).expect("second seed"));
    assert!(seed_element_type(&tx, ElementKind::Exercise).expect("first type seed"));
    assert!(!seed_element_type(&tx, ElementKind::Exercise).expect("second type seed"));
    tx.commit().expect("commit should succeed");

    let counts = table_counts(&connection).expect("counts should load");
    assert_eq!(counts.sections, 1);
    assert_eq!(counts.element_types, 1);
}

#[test]
fn add_element_twice_yields_one_row() {
    let (mut connection, subsection_id) = store_with_subsection(3, 5);
    let tx = connection.transaction().expect("transaction should start");

    let first = add_element(
        &tx,
        SubsectionRef::Id(subsection_id),
        ElementKind::Exercise,
        "6",
        "Show that P(A) <= 1.",
    )
    .expect("first insert");
    let second = add_element(
        &tx,
        SubsectionRef::Id(subsection_id),
        ElementKind::Exercise,
        "6",
        "A different body that must not overwrite.",
    )
    .expect("second insert");
    tx.commit().expect("commit should succeed");

    assert!(first);
    assert!(!second);

    let element = get_element(&connection, subsection_id, ElementKind::Exercise, "6")
        .expect("lookup should succeed")
        .expect("element should exist");
    assert_eq!(element.content, "Show that P(A) <= 1.");
    assert_eq!(table_counts(&connection).expect("counts").elements, 1);
}

#[test]
fn add_element_normalizes_number_and_cleans_content() {
    let (mut connection, subsection_id) = store_with_subsection(3, 5);
    let tx = connection.transaction().expect("transaction should start");
    add_element(
        &tx,
        SubsectionRef::Address {
            section: 3,
            subsection: 5,
        },
        ElementKind::Theorem,
        " I . 2 ",
        "\n## Statement\nEvery bounded sequence converges.  \n",
    )
    .expect("insert should succeed");
    tx.commit().expect("commit should succeed");

    let element = get_element(&connection, subsection_id, ElementKind::Theorem, "1.2")
        .expect("lookup should succeed")
        .expect("element should exist");
    assert_eq!(element.number, "1.2");
    assert_eq!(element.content, "Statement\nEvery bounded sequence converges.");
}

#[test]
fn add_element_creates_missing_type_row() {
    let (mut connection, subsection_id) = store_with_subsection(1, 1);
    assert_eq!(table_counts(&connection).expect("counts").element_types, 0);

    let tx = connection.transaction().expect("transaction should start");
    add_element(
        &tx,
        SubsectionRef::Id(subsection_id),
        ElementKind::Lemma,
        "4",
        "body",
    )
    .expect("insert should succeed");
    tx.commit().expect("commit should succeed");

    assert_eq!(table_counts(&connection).expect("counts").element_types, 1);
}

#[test]
fn add_element_reports_missing_parents() {
    let (mut connection, _) = store_with_subsection(3, 5);
    let tx = connection.transaction().expect("transaction should start");

    let missing_section = add_element(
        &tx,
        SubsectionRef::Address {
            section: 9,
            subsection: 1,
        },
        ElementKind::Solution,
        "1",
        "body",
    )
    .expect_err("missing section should fail");
    assert_eq!(
        missing_section.downcast_ref::<IngestError>(),
        Some(&IngestError::missing_section(9))
    );

    let missing_subsection = add_element(
        &tx,
        SubsectionRef::Address {
            section: 3,
            subsection: 7,
        },
        ElementKind::Solution,
        "1",
        "body",
    )
    .expect_err("missing subsection should fail");
    assert_eq!(
        missing_subsection.downcast_ref::<IngestError>(),
        Some(&IngestError::missing_subsection(3, 7))
    );
}

#[test]
fn upsert_subsection_requires_section_and_keeps_first_title() {
    let (mut connection, subsection_id) = store_with_subsection(2, 4);
    let tx = connection.transaction().expect("transaction should start");

    let again = upsert_subsection(&tx, 2, 4, "Renamed").expect("existing subsection");
    assert_eq!(
        again,
        SubsectionUpsert {
            id: subsection_id,
            created: false
        }
    );

    let err = upsert_subsection(&tx, 8, 1, "Orphan").expect_err("missing section should fail");
    assert!(matches!(
        err.downcast_ref::<IngestError>(),
        Some(IngestError::MissingParentEntity {
            entity: "section",
            ..
        })
    ));
}

#[test]
fn solution_lookup_follows_shared_address() {
    let (mut connection, subsection_id) = store_with_subsection(3, 5);
    let tx = connection.transaction().expect("transaction should start");
    add_element(
        &tx,
        SubsectionRef::Id(subsection_id),
        ElementKind::Exercise,
        "6",
        "exercise body",
    )
    .expect("exercise insert");
    add_element(
        &tx,
        SubsectionRef::Id(subsection_id),
        ElementKind::Exercise,
        "7",
        "unsolved exercise",
    )
    .expect("exercise insert");
    add_element(
        &tx,
        SubsectionRef::Address {
            section: 3,
            subsection: 5,
        },
        ElementKind::Solution,
        "6",
        "solution body",
    )
    .expect("solution insert");
    tx.commit().expect("commit should succeed");

    let exercise = get_element_at(&connection, 3, 5, ElementKind::Exercise, "6")
        .expect("lookup should succeed")
        .expect("exercise should exist");
    let solution = find_solution(&connection, &exercise)
        .expect("lookup should succeed")
        .expect("solution should exist");
    assert_eq!(solution.kind, ElementKind::Solution);
    assert_eq!(solution.number, "6");
    assert_eq!(solution.content, "solution body");

    let unsolved = get_element_at(&connection, 3, 5, ElementKind::Exercise, "7")
        .expect("lookup should succeed")
        .expect("exercise should exist");
    assert_eq!(find_solution(&connection, &unsolved).expect("lookup"), None);
}

#[test]
fn get_element_at_unknown_subsection_is_none() {
    let (connection, _) = store_with_subsection(3, 5);
    let found = get_element_at(&connection, 4, 1, ElementKind::Exercise, "1")
        .expect("lookup should succeed");
    assert!(found.is_none());
}

#[test]
fn random_element_respects_exclusions() {
    let (mut connection, subsection_id) = store_with_subsection(1, 1);
    let tx = connection.transaction().expect("transaction should start");
    for number in ["1", "2", "3"] {
        add_element(
            &tx,
            SubsectionRef::Id(subsection_id),
            ElementKind::Exercise,
            number,
            "body",
        )
        .expect("insert should succeed");
    }
    add_element(
        &tx,
        SubsectionRef::Id(subsection_id),
        ElementKind::Theorem,
        "1",
        "not an exercise",
    )
    .expect("insert should succeed");
    tx.commit().expect("commit should succeed");

    let first = get_element_at(&connection, 1, 1, ElementKind::Exercise, "1")
        .expect("lookup")
        .expect("exists");
    let second = get_element_at(&connection, 1, 1, ElementKind::Exercise, "2")
        .expect("lookup")
        .expect("exists");
    let third = get_element_at(&connection, 1, 1, ElementKind::Exercise, "3")
        .expect("lookup")
        .expect("exists");

    let excluding = HashSet::from([first.id, second.id]);
    for _ in 0..10 {
        let picked = get_random_element(&connection, ElementKind::Exercise, &excluding)
            .expect("random lookup")
            .expect("one exercise remains");
        assert_eq!(picked.id, third.id);
    }

    let all = HashSet::from([first.id, second.id, third.id]);
    assert_eq!(
        get_random_element(&connection, ElementKind::Exercise, &all).expect("random lookup"),
        None
    );

    let any = get_random_element(&connection, ElementKind::Exercise, &HashSet::new())
        .expect("random lookup")
        .expect("exercise exists");
    assert_eq!(any.kind, ElementKind::Exercise);
}

#[test]
fn count_elements_groups_by_section_including_empty_sections() {
    let (mut connection, subsection_id) = store_with_subsection(1, 1);
    let tx = connection.transaction().expect("transaction should start");
    seed_section(
        &tx,
        &SectionSeed {
            number: 2,
            title: "Random Variables".to_string(),
        },
    )
    .expect("section should seed");
    for number in ["1", "2"] {
        add_element(
            &tx,
            SubsectionRef::Id(subsection_id),
            ElementKind::Exercise,
            number,
            "body",
        )
        .expect("insert should succeed");
    }
    add_element(
        &tx,
        SubsectionRef::Id(subsection_id),
        ElementKind::Solution,
        "1",
        "body",
    )
    .expect("insert should succeed");
    tx.commit().expect("commit should succeed");

    let counts = count_elements(&connection, ElementKind::Exercise).expect("counts");
    assert_eq!(counts.get(&1), Some(&2));
    assert_eq!(counts.get(&2), Some(&0));

    let tables = count_elements(&connection, ElementKind::Table).expect("counts");
    assert!(tables.values().all(|count| *count == 0));
}

#[test]
fn add_link_is_unique_per_pair() {
    let (mut connection, subsection_id) = store_with_subsection(1, 1);
    let tx = connection.transaction().expect("transaction should start");
    for number in ["1", "2"] {
        add_element(
            &tx,
            SubsectionRef::Id(subsection_id),
            ElementKind::Example,
            number,
            "body",
        )
        .expect("insert should succeed");
    }
    let source = get_element(&tx, subsection_id, ElementKind::Example, "1")
        .expect("lookup")
        .expect("exists");
    let target = get_element(&tx, subsection_id, ElementKind::Example, "2")
        .expect("lookup")
        .expect("exists");

    assert!(add_link(&tx, source.id, target.id).expect("first link"));
    assert!(!add_link(&tx, source.id, target.id).expect("second link"));
    tx.commit().expect("commit should succeed");

    let links = links_from(&connection, source.id).expect("links");
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].target_element_id, target.id);
}

#[test]
fn metadata_records_schema_version() {
    let connection = open_in_memory().expect("in-memory store should open");
    assert_eq!(
        metadata_value(&connection, "db_schema_version").expect("metadata"),
        Some(DB_SCHEMA_VERSION.to_string())
    );
}

#[test]
fn subsection_lookup_carries_section_number() {
    let (connection, subsection_id) = store_with_subsection(3, 5);

    let (section, subsection) = get_subsection(&connection, subsection_id)
        .expect("lookup should succeed")
        .expect("subsection should exist");
    assert_eq!(section, 3);
    assert_eq!(subsection.number, 5);
    assert_eq!(subsection.title, "Sample Spaces");
    assert_eq!(get_subsection(&connection, subsection_id + 1).expect("lookup"), None);

    let sections = list_sections(&connection).expect("sections");
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].number, 3);
    assert_eq!(sections[0].title, "Probability");
}
