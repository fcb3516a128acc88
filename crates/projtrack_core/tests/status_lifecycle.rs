use chrono::NaiveDate;
use projtrack_core::{
    wrapper_readiness, AlwaysConfirm, CompletionOutcome, ConfirmRequest, ConfirmationPolicy,
    EntityKind, EntityStore, ErrorKind, InMemoryStorage, ModelStorage, NeverConfirm,
    ProjectCompletion, ProjectDraft, Status, StatusController, StatusError, StoreError,
    WrapperReadiness,
};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn draft(name: &str) -> ProjectDraft {
    ProjectDraft::new(name, date(2024, 4, 1), date(2024, 4, 30))
}

/// Returns (store, wrapper_id, [project ids]) with every project in progress.
fn wrapper_with_children(
    storage: &InMemoryStorage,
    children: usize,
) -> (EntityStore<&InMemoryStorage>, String, Vec<String>) {
    let mut store = EntityStore::open(storage).unwrap();
    let wrapper_id = store.add_wrapper("Release", Status::InProgress).unwrap();
    let project_ids = (0..children)
        .map(|index| {
            store
                .add_project(draft(&format!("task {index}")).in_wrapper(wrapper_id.clone()))
                .unwrap()
        })
        .collect();
    store.save().unwrap();
    (store, wrapper_id, project_ids)
}

#[test]
fn cascade_candidate_appears_only_after_last_child_completes() {
    let storage = InMemoryStorage::new();
    let (mut store, wrapper_id, projects) = wrapper_with_children(&storage, 2);
    let mut controller = StatusController::new(&mut store);

    let first = controller.complete_project(&projects[0]).unwrap();
    assert_eq!(
        first,
        ProjectCompletion::Completed {
            cascade_candidate: None
        }
    );

    let second = controller.complete_project(&projects[1]).unwrap();
    assert_eq!(second.cascade_candidate(), Some(wrapper_id.as_str()));

    assert_eq!(
        store.find_wrapper(&wrapper_id).unwrap().status,
        Status::InProgress
    );
}

#[test]
fn loose_project_never_has_a_cascade_candidate() {
    let storage = InMemoryStorage::new();
    let mut store = EntityStore::open(&storage).unwrap();
    let id = store.add_project(draft("Loose")).unwrap();

    let completion = StatusController::new(&mut store)
        .complete_project(&id)
        .unwrap();

    assert_eq!(completion.cascade_candidate(), None);
    assert!(store.find_project(&id).unwrap().is_completed());
}

#[test]
fn completing_a_project_persists_the_new_status() {
    let storage = InMemoryStorage::new();
    let (mut store, _, projects) = wrapper_with_children(&storage, 1);
    let saves_before = storage.save_count();

    StatusController::new(&mut store)
        .complete_project(&projects[0])
        .unwrap();

    assert_eq!(storage.save_count(), saves_before + 1);
    let reloaded = storage.load().unwrap();
    assert_eq!(
        reloaded.find_project(&projects[0]).unwrap().status,
        Status::Completed
    );
}

#[test]
fn completing_an_already_completed_project_is_a_noop() {
    let storage = InMemoryStorage::new();
    let (mut store, _, projects) = wrapper_with_children(&storage, 1);
    let mut controller = StatusController::new(&mut store);
    controller.complete_project(&projects[0]).unwrap();
    let saves_before = storage.save_count();

    let again = controller.complete_project(&projects[0]).unwrap();

    assert_eq!(again, ProjectCompletion::AlreadyCompleted);
    assert_eq!(storage.save_count(), saves_before);
}

#[test]
fn completing_unknown_project_returns_not_found() {
    let storage = InMemoryStorage::new();
    let mut store = EntityStore::open(&storage).unwrap();

    let err = StatusController::new(&mut store)
        .complete_project("ghost")
        .unwrap_err();

    assert!(matches!(err, StatusError::ProjectNotFound(ref id) if id == "ghost"));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn wrapper_with_pending_child_cannot_complete() {
    let storage = InMemoryStorage::new();
    let (mut store, wrapper_id, projects) = wrapper_with_children(&storage, 2);
    let mut controller = StatusController::new(&mut store);
    controller.complete_project(&projects[0]).unwrap();

    let err = controller.complete_wrapper(&wrapper_id).unwrap_err();

    match &err {
        StatusError::IncompleteChildren {
            wrapper_id: failed,
            pending,
        } => {
            assert_eq!(failed, &wrapper_id);
            assert_eq!(pending, &vec![projects[1].clone()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::IncompleteChildren);
    assert_eq!(
        store.find_wrapper(&wrapper_id).unwrap().status,
        Status::InProgress
    );
}

#[test]
fn childless_wrapper_cannot_complete() {
    let storage = InMemoryStorage::new();
    let (mut store, wrapper_id, _) = wrapper_with_children(&storage, 0);

    let err = StatusController::new(&mut store)
        .complete_wrapper(&wrapper_id)
        .unwrap_err();

    assert!(matches!(err, StatusError::WrapperHasNoChildren(_)));
    assert_eq!(
        wrapper_readiness(store.model(), &wrapper_id),
        WrapperReadiness::NoChildren
    );
}

#[test]
fn ready_wrapper_completes_and_rejects_a_second_completion() {
    let storage = InMemoryStorage::new();
    let (mut store, wrapper_id, projects) = wrapper_with_children(&storage, 2);
    let mut controller = StatusController::new(&mut store);
    for id in &projects {
        controller.complete_project(id).unwrap();
    }

    controller.complete_wrapper(&wrapper_id).unwrap();
    let err = controller.complete_wrapper(&wrapper_id).unwrap_err();

    assert!(matches!(
        err,
        StatusError::AlreadyCompleted {
            entity: EntityKind::Wrapper,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert!(!controller.is_cascade_candidate(&wrapper_id));
    assert!(storage.load().unwrap().find_wrapper(&wrapper_id).unwrap().is_completed());
}

#[test]
fn completing_unknown_wrapper_returns_not_found() {
    let storage = InMemoryStorage::new();
    let mut store = EntityStore::open(&storage).unwrap();

    let err = StatusController::new(&mut store)
        .complete_wrapper("ghost")
        .unwrap_err();

    assert!(matches!(err, StatusError::WrapperNotFound(_)));
}

#[test]
fn accepted_cascade_completes_the_wrapper() {
    let storage = InMemoryStorage::new();
    let (mut store, wrapper_id, projects) = wrapper_with_children(&storage, 2);
    let mut controller = StatusController::new(&mut store);

    let first = controller
        .complete_project_with_cascade(&projects[0], &mut AlwaysConfirm)
        .unwrap();
    assert_eq!(first, CompletionOutcome::ProjectCompleted);

    let second = controller
        .complete_project_with_cascade(&projects[1], &mut AlwaysConfirm)
        .unwrap();
    assert_eq!(
        second,
        CompletionOutcome::WrapperCompleted {
            wrapper_id: wrapper_id.clone()
        }
    );
    assert!(store.find_wrapper(&wrapper_id).unwrap().is_completed());
}

#[test]
fn declined_cascade_leaves_wrapper_in_progress() {
    let storage = InMemoryStorage::new();
    let (mut store, wrapper_id, projects) = wrapper_with_children(&storage, 1);

    let outcome = StatusController::new(&mut store)
        .complete_project_with_cascade(&projects[0], &mut NeverConfirm)
        .unwrap();

    assert_eq!(
        outcome,
        CompletionOutcome::CascadeDeclined {
            wrapper_id: wrapper_id.clone()
        }
    );
    assert!(store.find_project(&projects[0]).unwrap().is_completed());
    assert_eq!(
        store.find_wrapper(&wrapper_id).unwrap().status,
        Status::InProgress
    );
}

/// Accepts everything and records which wrappers it was asked to cascade.
#[derive(Default)]
struct RecordingPolicy {
    cascades: Vec<String>,
}

impl ConfirmationPolicy for RecordingPolicy {
    fn confirm(&mut self, request: &ConfirmRequest<'_>) -> bool {
        if let ConfirmRequest::CascadeComplete { wrapper } = request {
            self.cascades.push(wrapper.id.clone());
        }
        true
    }
}

#[test]
fn cascade_policy_is_asked_about_the_eligible_wrapper_only() {
    let storage = InMemoryStorage::new();
    let (mut store, wrapper_id, projects) = wrapper_with_children(&storage, 2);
    let mut policy = RecordingPolicy::default();

    let mut controller = StatusController::new(&mut store);
    controller
        .complete_project_with_cascade(&projects[0], &mut policy)
        .unwrap();
    controller
        .complete_project_with_cascade(&projects[1], &mut policy)
        .unwrap();

    assert_eq!(policy.cascades, vec![wrapper_id]);
}

#[test]
fn completed_wrapper_only_takes_completed_projects() {
    let storage = InMemoryStorage::new();
    let (mut store, wrapper_id, projects) = wrapper_with_children(&storage, 1);
    let mut controller = StatusController::new(&mut store);
    controller
        .complete_project_with_cascade(&projects[0], &mut AlwaysConfirm)
        .unwrap();
    drop(controller);

    let refused = store
        .add_project(draft("late").in_wrapper(wrapper_id.clone()))
        .unwrap_err();
    assert!(matches!(
        refused,
        StoreError::WrapperCompleted { wrapper_id: ref id } if id == &wrapper_id
    ));
    assert_eq!(store.model().child_count(&wrapper_id), 1);

    let late = store
        .add_project(
            draft("late")
                .in_wrapper(wrapper_id.clone())
                .with_status(Status::Completed),
        )
        .unwrap();
    let outcome = StatusController::new(&mut store)
        .complete_project_with_cascade(&late, &mut AlwaysConfirm)
        .unwrap();
    assert_eq!(outcome, CompletionOutcome::ProjectCompleted);
}

#[test]
fn failed_save_keeps_transition_in_memory() {
    let storage = InMemoryStorage::new();
    let (mut store, wrapper_id, projects) = wrapper_with_children(&storage, 1);
    storage.set_read_only(true);

    let err = StatusController::new(&mut store)
        .complete_project(&projects[0])
        .unwrap_err();

    assert!(matches!(
        err,
        StatusError::ProjectUnsaved { ref project_id, .. } if project_id == &projects[0]
    ));
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert!(std::error::Error::source(&err).is_some());
    assert!(store.find_project(&projects[0]).unwrap().is_completed());
    assert_eq!(
        storage.load().unwrap().find_project(&projects[0]).unwrap().status,
        Status::InProgress
    );
    assert_eq!(err.cascade_candidate(), Some(wrapper_id.as_str()));
}

#[test]
fn unsaved_completion_still_reports_the_cascade_candidate() {
    let storage = InMemoryStorage::new();
    let (mut store, wrapper_id, projects) = wrapper_with_children(&storage, 2);
    let mut controller = StatusController::new(&mut store);
    controller.complete_project(&projects[0]).unwrap();
    storage.set_read_only(true);

    let err = controller.complete_project(&projects[1]).unwrap_err();
    assert_eq!(err.cascade_candidate(), Some(wrapper_id.as_str()));

    storage.set_read_only(false);
    assert!(controller.is_cascade_candidate(&wrapper_id));
    controller.complete_wrapper(&wrapper_id).unwrap();
    assert!(storage.load().unwrap().find_wrapper(&wrapper_id).unwrap().is_completed());
}

#[test]
fn unsaved_loose_completion_has_no_candidate() {
    let storage = InMemoryStorage::new();
    let mut store = EntityStore::open(&storage).unwrap();
    let id = store.add_project(draft("Loose")).unwrap();
    storage.set_read_only(true);

    let err = StatusController::new(&mut store)
        .complete_project(&id)
        .unwrap_err();

    assert!(matches!(err, StatusError::ProjectUnsaved { .. }));
    assert_eq!(err.cascade_candidate(), None);
}
