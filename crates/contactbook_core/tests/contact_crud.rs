use contactbook_core::db::migrations::latest_version;
use contactbook_core::db::open_db_in_memory;
use contactbook_core::{
    Address, Contact, ContactListQuery, ContactRepository, ContactValidationError, RepoError,
    SqliteContactRepository,
};
use rusqlite::Connection;

#[test]
fn insert_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::try_new(&conn).unwrap();

    let contact = Contact::new("Jessica Abigail")
        .with_phone("62482211")
        .with_email("jessica@ngilang.com");
    let id = repo.insert_contact(&contact).unwrap();

    let loaded = repo.get_contact(id).unwrap().unwrap();
    assert_eq!(loaded.id, Some(id));
    assert_eq!(
        Contact {
            id: None,
            ..loaded
        },
        contact
    );
}

#[test]
fn insert_ignores_caller_supplied_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::try_new(&conn).unwrap();

    let contact = Contact {
        id: Some(42),
        ..Contact::new("Caller Id")
    };
    let id = repo.insert_contact(&contact).unwrap();

    assert_eq!(id, 1);
    assert!(!repo.contact_exists(42).unwrap());
}

#[test]
fn update_replaces_every_field() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::try_new(&conn).unwrap();

    let id = repo
        .insert_contact(&Contact::new("Draft").with_phone("62482211").with_note("old"))
        .unwrap();

    let replacement = Contact {
        id: Some(id),
        ..Contact::new("Final").with_email("final@example.com")
    };
    repo.update_contact(&replacement).unwrap();

    let loaded = repo.get_contact(id).unwrap().unwrap();
    assert_eq!(loaded, replacement);
    assert_eq!(loaded.phone, None);
    assert_eq!(loaded.note, None);
}

#[test]
fn update_not_found_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::try_new(&conn).unwrap();

    let missing = Contact {
        id: Some(99),
        ..Contact::new("missing")
    };
    let err = repo.update_contact(&missing).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(99)));
}

#[test]
fn update_address_touches_only_address_columns() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::try_new(&conn).unwrap();

    let original = Contact::new("Jessica")
        .with_phone("62482211")
        .with_email("jessica@ngilang.com")
        .with_note("met at conference");
    let id = repo.insert_contact(&original).unwrap();

    let address = Address {
        address1: Some("888 Constantine Ave, #54".to_string()),
        address2: Some("San Angeles".to_string()),
        address3: Some("Florida".to_string()),
        postal_code: Some("32106".to_string()),
    };
    repo.update_address(id, &address).unwrap();

    let loaded = repo.get_contact(id).unwrap().unwrap();
    assert_eq!(loaded.address(), address);
    assert_eq!(loaded.name, original.name);
    assert_eq!(loaded.phone, original.phone);
    assert_eq!(loaded.email, original.email);
    assert_eq!(loaded.note, original.note);
}

#[test]
fn validation_failure_blocks_insert_and_update() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::try_new(&conn).unwrap();

    let err = repo.insert_contact(&Contact::new("")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ContactValidationError::BlankName)
    ));

    let id = repo.insert_contact(&Contact::new("valid")).unwrap();
    let invalid = Contact {
        id: Some(id),
        ..Contact::new("valid").with_phone("abc")
    };
    let err = repo.update_contact(&invalid).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ContactValidationError::InvalidPhone(_))
    ));
    assert_eq!(repo.count_contacts().unwrap(), 1);
}

#[test]
fn delete_removes_row_and_reports_missing_ids() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::try_new(&conn).unwrap();

    let id = repo.insert_contact(&Contact::new("short lived")).unwrap();
    repo.delete_contact(id).unwrap();

    assert!(repo.get_contact(id).unwrap().is_none());
    assert!(matches!(
        repo.delete_contact(id).unwrap_err(),
        RepoError::NotFound(found) if found == id
    ));
}

#[test]
fn find_duplicate_matches_name_ignoring_case_and_same_phone() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::try_new(&conn).unwrap();

    let id = repo
        .insert_contact(&Contact::new("Jessica Abigail").with_phone("62482211"))
        .unwrap();
    let no_phone = repo.insert_contact(&Contact::new("Lee")).unwrap();

    let same = Contact::new("  jessica abigail ").with_phone("62482211");
    assert_eq!(repo.find_duplicate(&same).unwrap(), Some(id));

    let other_phone = Contact::new("Jessica Abigail").with_phone("62482212");
    assert_eq!(repo.find_duplicate(&other_phone).unwrap(), None);

    assert_eq!(
        repo.find_duplicate(&Contact::new("LEE")).unwrap(),
        Some(no_phone)
    );
    assert_eq!(
        repo.find_duplicate(&Contact::new("Lee").with_phone("62482211"))
            .unwrap(),
        None
    );
}

#[test]
fn list_orders_by_id_and_paginates() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::try_new(&conn).unwrap();

    let ids: Vec<_> = ["c", "a", "b", "d"]
        .into_iter()
        .map(|name| repo.insert_contact(&Contact::new(name)).unwrap())
        .collect();

    let page = repo
        .list_contacts(&ContactListQuery {
            limit: Some(2),
            offset: 1,
            ..ContactListQuery::default()
        })
        .unwrap();
    let page_ids: Vec<_> = page.iter().filter_map(|c| c.id).collect();
    assert_eq!(page_ids, vec![ids[1], ids[2]]);

    let tail = repo
        .list_contacts(&ContactListQuery {
            offset: 3,
            ..ContactListQuery::default()
        })
        .unwrap();
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].id, Some(ids[3]));
}

#[test]
fn list_filters_by_name_substring_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::try_new(&conn).unwrap();

    for name in ["Jessica Abigail", "Abigail Jones", "Mark", "100% Real_Name"] {
        repo.insert_contact(&Contact::new(name)).unwrap();
    }

    let names = |filter: &str| -> Vec<String> {
        repo.list_contacts(&ContactListQuery {
            name_contains: Some(filter.to_string()),
            ..ContactListQuery::default()
        })
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect()
    };

    assert_eq!(names("abig"), vec!["Jessica Abigail", "Abigail Jones"]);
    assert_eq!(names("MARK"), vec!["Mark"]);
    assert_eq!(names("%"), vec!["100% Real_Name"]);
    assert_eq!(names("e_l"), Vec::<String>::new());
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteContactRepository::try_new(&conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_contacts_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteContactRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("contacts"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE contacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            phone TEXT,
            email TEXT
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteContactRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "contacts",
            column: "address1"
        })
    ));
}

#[test]
fn read_path_rejects_blank_persisted_name() {
    let conn = open_db_in_memory().unwrap();
    // Bypass the CHECK constraint to simulate a corrupted row.
    conn.execute_batch("PRAGMA ignore_check_constraints = ON;")
        .unwrap();
    conn.execute("INSERT INTO contacts (name) VALUES ('');", [])
        .unwrap();
    let id = conn.last_insert_rowid();

    let repo = SqliteContactRepository::try_new(&conn).unwrap();
    assert!(matches!(
        repo.get_contact(id).unwrap_err(),
        RepoError::InvalidData(_)
    ));
}
