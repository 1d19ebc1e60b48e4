use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;
use taskdeck_core::{
    Clock, Filter, IdAllocator, LoadOutcome, MemoryStore, PersistenceError, PersistenceStore,
    StoreError, StoreResult, Task, TaskId, TaskStore, ValidationError, MAX_TASK_ID,
    MAX_TASK_TEXT_CHARS, TASKS_STORAGE_KEY,
};

const BASE_MS: i64 = 1_700_000_000_000;

/// Clock frozen at one instant, so every add lands in the same tick.
struct FrozenClock(DateTime<Utc>);

impl FrozenClock {
    fn at_ms(ms: i64) -> Self {
        Self(Utc.timestamp_millis_opt(ms).single().unwrap())
    }
}

impl Clock for FrozenClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

fn new_store() -> TaskStore<MemoryStore, FrozenClock> {
    TaskStore::open(MemoryStore::new(), FrozenClock::at_ms(BASE_MS))
}

fn ids(tasks: &[&Task]) -> HashSet<TaskId> {
    tasks.iter().map(|task| task.id).collect()
}

#[test]
fn add_prepends_and_increments_total() {
    let mut store = new_store();
    let first = store.add("Buy milk").unwrap();
    let before = store.stats().total;

    let second = store.add("  Write report  ").unwrap();

    assert_eq!(store.stats().total, before + 1);
    assert_eq!(second.text, "Write report");
    assert!(!second.completed);
    assert_eq!(second.created_at, "2023-11-14T22:13:20.000Z");
    let all = store.filtered_view(Filter::All);
    assert_eq!(all[0].id, second.id);
    assert_eq!(all[1].id, first.id);
}

#[test]
fn add_in_same_tick_issues_distinct_increasing_ids() {
    let mut store = new_store();
    let a = store.add("a").unwrap();
    let b = store.add("b").unwrap();
    let c = store.add("c").unwrap();

    assert_eq!(a.id, TaskId::new(BASE_MS));
    assert!(a.id < b.id && b.id < c.id);
}

#[test]
fn add_rejects_empty_and_too_long_text_without_changing_state() {
    let mut store = new_store();
    store.add("keep").unwrap();
    let snapshot = store.tasks().to_vec();

    assert_eq!(store.add("   \n\t"), Err(ValidationError::Empty));
    let too_long = "x".repeat(MAX_TASK_TEXT_CHARS + 1);
    assert_eq!(
        store.add(&too_long),
        Err(ValidationError::TooLong {
            chars: MAX_TASK_TEXT_CHARS + 1,
            max: MAX_TASK_TEXT_CHARS,
        })
    );

    assert_eq!(store.tasks(), snapshot.as_slice());
}

#[test]
fn add_accepts_text_at_limit_after_trimming() {
    let mut store = new_store();
    let text = format!("  {}  ", "y".repeat(MAX_TASK_TEXT_CHARS));
    let task = store.add(&text).unwrap();
    assert_eq!(task.text.chars().count(), MAX_TASK_TEXT_CHARS);
}

#[test]
fn toggle_missing_id_returns_false_and_keeps_stats() {
    let mut store = new_store();
    store.add("one").unwrap();
    let stats = store.stats();

    assert!(!store.toggle(TaskId::new(42)));
    assert_eq!(store.stats(), stats);
}

#[test]
fn toggle_twice_restores_original_state() {
    let mut store = new_store();
    let task = store.add("flip").unwrap();

    assert!(store.toggle(task.id));
    assert!(store.get(task.id).unwrap().completed);
    assert!(store.toggle(task.id));
    assert!(!store.get(task.id).unwrap().completed);
}

#[test]
fn delete_reports_whether_a_task_was_removed() {
    let mut store = new_store();
    let task = store.add("gone").unwrap();

    assert!(store.delete(task.id));
    assert!(!store.delete(task.id));
    assert!(store.is_empty());
}

#[test]
fn pending_and_completed_partition_all() {
    let mut store = new_store();
    let mut created = Vec::new();
    for text in ["a", "b", "c", "d", "e"] {
        created.push(store.add(text).unwrap());
    }
    store.toggle(created[1].id);
    store.toggle(created[3].id);
    store.toggle(created[4].id);

    let all = ids(&store.filtered_view(Filter::All));
    let pending = ids(&store.filtered_view(Filter::Pending));
    let completed = ids(&store.filtered_view(Filter::Completed));

    assert!(pending.is_disjoint(&completed));
    let union: HashSet<TaskId> = pending.union(&completed).copied().collect();
    assert_eq!(union, all);
}

#[test]
fn filtered_views_keep_collection_order() {
    let mut store = new_store();
    let a = store.add("a").unwrap();
    let b = store.add("b").unwrap();
    let c = store.add("c").unwrap();
    store.toggle(a.id);
    store.toggle(c.id);

    let completed: Vec<TaskId> = store
        .filtered_view(Filter::Completed)
        .iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(completed, vec![c.id, a.id]);
    assert_eq!(store.filtered_view(Filter::Pending)[0].id, b.id);
}

#[test]
fn clear_completed_with_nothing_completed_never_prompts() {
    let mut store = new_store();
    store.add("open").unwrap();
    let mut asked = 0;

    let removed = store.clear_completed(&mut |_: &str| {
        asked += 1;
        true
    });

    assert_eq!(removed, 0);
    assert_eq!(asked, 0);
}

#[test]
fn clear_completed_confirmed_removes_exactly_completed_tasks() {
    let mut store = new_store();
    let a = store.add("a").unwrap();
    let b = store.add("b").unwrap();
    let c = store.add("c").unwrap();
    store.toggle(a.id);
    store.toggle(c.id);
    let mut messages = Vec::new();

    let removed = store.clear_completed(&mut |message: &str| {
        messages.push(message.to_string());
        true
    });

    assert_eq!(removed, 2);
    assert_eq!(messages, vec!["Delete 2 completed task(s)?".to_string()]);
    assert_eq!(store.stats().completed, 0);
    assert_eq!(store.stats().total, 1);
    assert_eq!(store.tasks()[0].id, b.id);
}

#[test]
fn clear_completed_declined_is_a_no_op() {
    let mut store = new_store();
    let a = store.add("a").unwrap();
    store.toggle(a.id);

    assert_eq!(store.clear_completed(&mut |_: &str| false), 0);
    assert_eq!(store.stats().completed, 1);
}

#[test]
fn two_phase_clear_rejects_stale_confirmation() {
    let mut store = new_store();
    let a = store.add("a").unwrap();
    let b = store.add("b").unwrap();
    store.toggle(a.id);

    let request = store.request_clear_completed().unwrap();
    assert_eq!(request.count(), 1);

    store.toggle(b.id);
    let err = store.commit_clear_completed(&request).unwrap_err();
    assert_eq!(err.confirmed, 1);
    assert_eq!(err.current, 2);
    assert_eq!(store.stats().total, 2);

    let fresh = store.request_clear_completed().unwrap();
    assert_eq!(store.commit_clear_completed(&fresh), Ok(2));
    assert!(store.is_empty());
}

#[test]
fn request_clear_completed_is_none_without_completed_tasks() {
    let mut store = new_store();
    store.add("a").unwrap();
    assert!(store.request_clear_completed().is_none());
}

#[test]
fn example_scenario_from_empty_store() {
    let mut store = new_store();
    let milk = store.add("Buy milk").unwrap();
    let report = store.add("Write report").unwrap();

    let texts: Vec<&str> = store.tasks().iter().map(|task| task.text.as_str()).collect();
    assert_eq!(texts, vec!["Write report", "Buy milk"]);

    assert!(store.toggle(milk.id));
    let completed: Vec<TaskId> = store
        .filtered_view(Filter::Completed)
        .iter()
        .map(|task| task.id)
        .collect();
    let pending: Vec<TaskId> = store
        .filtered_view(Filter::Pending)
        .iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(completed, vec![milk.id]);
    assert_eq!(pending, vec![report.id]);
    assert_eq!(store.stats().total, 2);
    assert_eq!(store.stats().completed, 1);
}

#[test]
fn persisted_collection_round_trips_in_order() {
    let mut store = new_store();
    let a = store.add("first").unwrap();
    store.add("second").unwrap();
    store.add("third").unwrap();
    store.toggle(a.id);
    let expected = store.tasks().to_vec();

    let backing = store.store().clone();
    let reloaded = TaskStore::open(backing, FrozenClock::at_ms(BASE_MS));

    assert_eq!(reloaded.tasks(), expected.as_slice());
}

#[test]
fn persisted_json_uses_wire_field_names() {
    let mut store = new_store();
    let task = store.add("wire").unwrap();

    let raw = store.store().raw(TASKS_STORAGE_KEY).unwrap();
    let value: serde_json::Value = serde_json::from_str(raw).unwrap();
    assert_eq!(value[0]["id"], task.id.get());
    assert_eq!(value[0]["text"], "wire");
    assert_eq!(value[0]["completed"], false);
    assert_eq!(value[0]["createdAt"], "2023-11-14T22:13:20.000Z");
}

#[test]
fn load_reads_collection_written_by_other_clients() {
    let mut backing = MemoryStore::new();
    backing
        .set(
            TASKS_STORAGE_KEY,
            r#"[
                {"id": 1700000000500, "text": "newer", "completed": true, "createdAt": "2023-11-14T22:13:20.500Z"},
                {"id": 1700000000100, "text": "older", "completed": false, "createdAt": "2023-11-14T22:13:20.100Z"}
            ]"#,
        )
        .unwrap();

    let mut store = TaskStore::with_clock(backing, FrozenClock::at_ms(BASE_MS));
    assert_eq!(store.load(), LoadOutcome::Loaded(2));
    assert_eq!(store.tasks()[0].text, "newer");
    assert!(store.tasks()[0].completed);

    // The clock is behind the loaded ids; new ids must still be fresh.
    let added = store.add("after load").unwrap();
    assert_eq!(added.id, TaskId::new(1_700_000_000_501));
}

#[test]
fn load_missing_key_yields_empty_collection() {
    let mut store = TaskStore::with_clock(MemoryStore::new(), FrozenClock::at_ms(BASE_MS));
    assert_eq!(store.load(), LoadOutcome::Missing);
    assert!(store.is_empty());
}

#[test]
fn load_falls_back_to_empty_on_bad_payloads() {
    let payloads = [
        "not json",
        r#"{"id": 1}"#,
        r#"[{"id": 1, "text": "   ", "completed": false, "createdAt": "x"}]"#,
        r#"[{"id": 1, "text": "a", "completed": false, "createdAt": "x"},
            {"id": 1, "text": "b", "completed": false, "createdAt": "y"}]"#,
    ];

    for payload in payloads {
        let mut backing = MemoryStore::new();
        backing.set(TASKS_STORAGE_KEY, payload).unwrap();
        let mut store = TaskStore::with_clock(backing, FrozenClock::at_ms(BASE_MS));

        let outcome = store.load();
        assert!(
            matches!(outcome, LoadOutcome::Recovered { .. }),
            "payload {payload:?} gave {outcome:?}"
        );
        assert!(store.is_empty());
    }
}

struct UnreadableStore;

impl PersistenceStore for UnreadableStore {
    fn get(&self, _key: &str) -> StoreResult<Option<String>> {
        Err(StoreError::Unavailable("disk detached".to_string()))
    }

    fn set(&mut self, _key: &str, _value: &str) -> StoreResult<()> {
        Err(StoreError::Unavailable("disk detached".to_string()))
    }
}

#[test]
fn load_read_failure_degrades_to_empty() {
    let mut store = TaskStore::with_clock(UnreadableStore, FrozenClock::at_ms(BASE_MS));
    let outcome = store.load();
    assert!(matches!(outcome, LoadOutcome::Recovered { reason } if reason.contains("disk detached")));
    assert!(store.is_empty());
}

#[test]
fn failed_write_keeps_in_memory_mutation_and_records_warning() {
    let mut store = TaskStore::open(MemoryStore::with_quota(256), FrozenClock::at_ms(BASE_MS));
    store.add("fits").unwrap();
    assert!(store.take_persist_warning().is_none());
    let persisted = store.store().raw(TASKS_STORAGE_KEY).unwrap().to_string();

    let task = store.add(&"z".repeat(100)).unwrap();

    assert_eq!(store.stats().total, 2);
    assert_eq!(store.tasks()[0].id, task.id);
    assert!(matches!(
        store.take_persist_warning(),
        Some(PersistenceError::Store(StoreError::Quota { .. }))
    ));
    assert!(store.take_persist_warning().is_none());
    // The store still holds the last good write.
    assert_eq!(store.store().raw(TASKS_STORAGE_KEY), Some(persisted.as_str()));
}

#[test]
fn successful_write_clears_earlier_warning() {
    let mut store = TaskStore::open(MemoryStore::with_quota(200), FrozenClock::at_ms(BASE_MS));
    let big = store.add(&"z".repeat(150)).unwrap();
    assert!(store.store().raw(TASKS_STORAGE_KEY).is_none());

    assert!(store.delete(big.id));
    assert!(store.take_persist_warning().is_none());
    assert_eq!(store.store().raw(TASKS_STORAGE_KEY), Some("[]"));
}

fn store_with_single_id(id: i64) -> MemoryStore {
    let mut backing = MemoryStore::new();
    backing
        .set(
            TASKS_STORAGE_KEY,
            &format!(r#"[{{"id": {id}, "text": "last", "completed": false, "createdAt": "x"}}]"#),
        )
        .unwrap();
    backing
}

#[test]
fn add_after_highest_possible_id_fails_instead_of_reusing_it() {
    let mut store = TaskStore::open(
        store_with_single_id(MAX_TASK_ID),
        FrozenClock::at_ms(BASE_MS),
    );
    let persisted = store.store().raw(TASKS_STORAGE_KEY).unwrap().to_string();

    assert_eq!(store.add("next"), Err(ValidationError::IdsExhausted));

    assert_eq!(store.len(), 1);
    assert_eq!(store.store().raw(TASKS_STORAGE_KEY), Some(persisted.as_str()));
    let mut reloaded = TaskStore::with_clock(store.store().clone(), FrozenClock::at_ms(BASE_MS));
    assert_eq!(reloaded.load(), LoadOutcome::Loaded(1));
}

#[test]
fn load_rejects_ids_beyond_the_issuable_range() {
    let mut store = TaskStore::with_clock(
        store_with_single_id(i64::MAX),
        FrozenClock::at_ms(BASE_MS),
    );

    let outcome = store.load();

    assert!(matches!(outcome, LoadOutcome::Recovered { reason } if reason.contains("out of range")));
    assert!(store.is_empty());
}

#[test]
fn carried_allocator_keeps_ids_increasing_across_rebuilt_stores() {
    let mut first = new_store();
    let a = first.add("a").unwrap();
    let backing = first.store().clone();
    let ids = first.id_allocator().clone();

    let mut second =
        TaskStore::with_clock(backing, FrozenClock::at_ms(BASE_MS)).with_id_allocator(ids);
    assert_eq!(second.load(), LoadOutcome::Loaded(1));
    assert!(second.delete(a.id));
    let backing = second.store().clone();
    let ids = second.id_allocator().clone();

    let mut third =
        TaskStore::with_clock(backing, FrozenClock::at_ms(BASE_MS)).with_id_allocator(ids);
    assert_eq!(third.load(), LoadOutcome::Loaded(0));
    let b = third.add("b").unwrap();

    assert!(b.id > a.id, "{} should be above {}", b.id, a.id);
}

#[test]
fn with_id_allocator_keeps_observed_floor() {
    let mut ids = IdAllocator::new();
    ids.observe(TaskId::new(BASE_MS + 10));

    let store = TaskStore::with_clock(MemoryStore::new(), FrozenClock::at_ms(BASE_MS))
        .with_id_allocator(ids);

    assert_eq!(store.id_allocator().last(), Some(TaskId::new(BASE_MS + 10)));
}

#[test]
fn load_drops_warning_from_an_earlier_failed_write() {
    let mut store = TaskStore::open(MemoryStore::with_quota(64), FrozenClock::at_ms(BASE_MS));
    store.add(&"z".repeat(100)).unwrap();

    store.load();

    assert!(store.take_persist_warning().is_none());
    assert!(store.is_empty());
}
