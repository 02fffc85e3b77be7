//! Pagination integration tests over the real SQLite store:
//! - 45-row walk with 20 rows per page and page clamping
//! - latest-activity ordering end to end
//! - filter composition (search, active view, city special cases)

use std::sync::Arc;

use taller_core::{
    CityMatch, ConnectionPool, FilterCompiler, FilterSpec, PageConfig, PageRequest,
    PaginationEngine, PoolConfig, ServiceKind, SqliteTicketStore, TicketScope, TicketState,
    TicketStore,
};

struct TestHarness {
    pool: Arc<ConnectionPool>,
    store: Arc<SqliteTicketStore>,
    engine: PaginationEngine,
}

impl TestHarness {
    fn new() -> Self {
        let pool = Arc::new(ConnectionPool::in_memory(PoolConfig::default()).unwrap());
        let store = Arc::new(SqliteTicketStore::new(Arc::clone(&pool)).unwrap());
        let engine = PaginationEngine::new(
            Arc::clone(&store) as Arc<dyn TicketStore>,
            FilterCompiler::new(CityMatch::Exact),
            PageConfig::ticket_list(),
        );
        Self { pool, store, engine }
    }

    fn create_tickets(&self, count: usize) -> Vec<i64> {
        (0..count)
            .map(|i| {
                let mut ticket = taller_core::testing::new_ticket(&format!("imei-{i:03}"));
                ticket.city = if i % 2 == 0 {
                    "Medellín".to_string()
                } else {
                    "Bogotá".to_string()
                };
                self.store.create(ticket).unwrap().id
            })
            .collect()
    }

    fn set_created(&self, id: i64, rfc3339: &str) {
        let guard = self.pool.acquire().unwrap();
        guard
            .execute(
                "UPDATE tickets SET created_at = ? WHERE id = ?",
                rusqlite::params![rfc3339, id],
            )
            .unwrap();
    }
}

#[test]
fn test_45_rows_paginate_into_3_pages() {
    let harness = TestHarness::new();
    harness.create_tickets(45);

    let page1 = harness
        .engine
        .paginate(TicketScope::All, PageRequest::page(1), &FilterSpec::new());
    assert_eq!(page1.items.len(), 20);
    assert_eq!(page1.total, 45);
    assert_eq!(page1.pages, 3);
    assert!(!page1.has_prev);
    assert!(page1.has_next);

    let page3 = harness
        .engine
        .paginate(TicketScope::All, PageRequest::page(3), &FilterSpec::new());
    assert_eq!(page3.items.len(), 5);
    assert!(page3.has_prev);
    assert!(!page3.has_next);

    // Requesting far past the end clamps to the last page.
    let clamped = harness
        .engine
        .paginate(TicketScope::All, PageRequest::page(99), &FilterSpec::new());
    assert_eq!(clamped.page, 3);
    assert_eq!(clamped.items.len(), 5);
}

#[test]
fn test_pages_do_not_overlap() {
    let harness = TestHarness::new();
    harness.create_tickets(45);

    let mut seen = std::collections::HashSet::new();
    for page in 1..=3 {
        let result = harness.engine.paginate(
            TicketScope::All,
            PageRequest::page(page),
            &FilterSpec::new(),
        );
        for ticket in &result.items {
            assert!(seen.insert(ticket.id), "ticket {} on two pages", ticket.id);
        }
    }
    assert_eq!(seen.len(), 45);
}

#[test]
fn test_latest_activity_ordering_end_to_end() {
    let harness = TestHarness::new();
    let ids = harness.create_tickets(3);
    let (a, b, c) = (ids[0], ids[1], ids[2]);

    harness.set_created(a, "2023-12-01T00:00:00.000000Z");
    harness.set_created(b, "2023-12-02T00:00:00.000000Z");
    harness.set_created(c, "2024-01-01T00:00:00.000000Z");
    {
        let guard = harness.pool.acquire().unwrap();
        guard
            .execute(
                "UPDATE tickets SET finished_at = '2024-02-01T00:00:00.000000Z', state = 'finished' WHERE id = ?",
                rusqlite::params![a],
            )
            .unwrap();
        guard
            .execute(
                "UPDATE tickets SET assigned_at = '2024-03-01T00:00:00.000000Z', state = 'assigned' WHERE id = ?",
                rusqlite::params![b],
            )
            .unwrap();
    }

    let result = harness
        .engine
        .paginate(TicketScope::All, PageRequest::page(1), &FilterSpec::new());
    let order: Vec<i64> = result.items.iter().map(|t| t.id).collect();
    assert_eq!(order, vec![b, a, c]);
}

#[test]
fn test_active_view_excludes_terminal_state() {
    let harness = TestHarness::new();
    let ids = harness.create_tickets(4);
    harness.store.update_state(ids[0], TicketState::Finished).unwrap();

    let filters = FilterSpec::new().with("state_not", "finished");
    let result = harness
        .engine
        .paginate(TicketScope::All, PageRequest::page(1), &filters);
    assert_eq!(result.total, 3);
    assert!(result.items.iter().all(|t| t.state != TicketState::Finished));
}

#[test]
fn test_city_filter_matches_accented_spellings() {
    let harness = TestHarness::new();
    harness.create_tickets(10); // 5 Medellín, 5 Bogotá

    for spelling in ["medellin", "Medellín"] {
        let filters = FilterSpec::new().with("city", spelling);
        let result = harness
            .engine
            .paginate(TicketScope::All, PageRequest::page(1), &filters);
        assert_eq!(result.total, 5, "spelling {spelling:?}");
    }

    let filters = FilterSpec::new().with("city", "bogota");
    let result = harness
        .engine
        .paginate(TicketScope::All, PageRequest::page(1), &filters);
    assert_eq!(result.total, 5);
}

#[test]
fn test_search_filter_spans_fields() {
    let harness = TestHarness::new();
    harness.create_tickets(5);

    let filters = FilterSpec::new().with("search", "imei-003");
    let result = harness
        .engine
        .paginate(TicketScope::All, PageRequest::page(1), &filters);
    assert_eq!(result.total, 1);
    assert_eq!(result.items[0].imei, "imei-003");
}

#[test]
fn test_service_scoped_views_are_disjoint() {
    let harness = TestHarness::new();
    harness.create_tickets(3); // all technical service
    let mut warranty = taller_core::testing::new_ticket("warranty-1");
    warranty.service = ServiceKind::Warranty;
    harness.store.create(warranty).unwrap();

    let technical = harness.engine.paginate(
        TicketScope::Service(ServiceKind::TechnicalService),
        PageRequest::page(1),
        &FilterSpec::new(),
    );
    assert_eq!(technical.total, 3);

    let warranties = harness.engine.paginate(
        TicketScope::Service(ServiceKind::Warranty),
        PageRequest::page(1),
        &FilterSpec::new(),
    );
    assert_eq!(warranties.total, 1);
}

#[test]
fn test_generic_paginator_city_substring_mode() {
    let harness = TestHarness::new();
    let mut ticket = taller_core::testing::new_ticket("a");
    ticket.city = "Cali Norte".to_string();
    harness.store.create(ticket).unwrap();

    let engine = PaginationEngine::new(
        Arc::clone(&harness.store) as Arc<dyn TicketStore>,
        FilterCompiler::new(CityMatch::Substring),
        PageConfig::default(),
    );
    let filters = FilterSpec::new().with("city", "cali");
    let result = engine.paginate(TicketScope::All, PageRequest::page(1), &filters);
    assert_eq!(result.total, 1);

    // The exact-mode engine misses on the same spec.
    let result = harness
        .engine
        .paginate(TicketScope::All, PageRequest::page(1), &filters);
    assert_eq!(result.total, 0);
}
