use cpm_planner::{
    Project, ProjectEvent, ProjectMetadata, RelationType, ScheduleError, SchedulerConfig, TaskSpec,
};

#[test]
fn mutations_inside_a_batch_defer_the_pass() {
    let mut project = Project::new();
    let mut batch = project.batch();
    let a = batch.add_task(TaskSpec::new("A").duration_days(2)).unwrap();
    let b = batch.add_task(TaskSpec::new("B")).unwrap();
    batch.add_predecessor(b, a, RelationType::FS, 0).unwrap();
    assert!(batch.is_batched());
    assert!(batch.needs_reschedule());
    assert!(!batch.task(b).unwrap().schedule().scheduled);

    let summary = batch.finish().unwrap().expect("outermost end runs the pass");
    assert_eq!(summary.task_count, 2);
    assert!(!project.is_batched());
    assert!(!project.needs_reschedule());
    assert_eq!(project.task(b).unwrap().start(), project.task(a).unwrap().finish());
}

#[test]
fn only_the_outermost_end_reschedules() {
    let mut project = Project::new();
    project.begin_batch();
    project.begin_batch();
    project.add_task(TaskSpec::new("A")).unwrap();

    assert!(project.end_batch().unwrap().is_none());
    assert!(project.is_batched());
    assert!(project.needs_reschedule());

    assert!(project.end_batch().unwrap().is_some());
    assert!(!project.needs_reschedule());
}

#[test]
fn an_empty_batch_does_not_reschedule() {
    let mut project = Project::new();
    project.begin_batch();
    assert!(project.end_batch().unwrap().is_none());
}

#[test]
fn unbalanced_end_is_an_error() {
    let mut project = Project::new();
    assert!(matches!(
        project.end_batch().unwrap_err(),
        ScheduleError::InvalidOperation(_)
    ));
}

#[test]
fn dropping_the_guard_runs_the_pass() {
    let mut project = Project::new();
    let a = {
        let mut batch = project.batch();
        batch.add_task(TaskSpec::new("A")).unwrap()
    };
    assert!(!project.is_batched());
    assert!(project.task(a).unwrap().schedule().scheduled);
}

#[test]
fn manual_mode_waits_for_reschedule_now() {
    let config = SchedulerConfig {
        auto_reschedule: false,
        ..SchedulerConfig::default()
    };
    let mut project = Project::with_config(ProjectMetadata::default(), config);
    let a = project.add_task(TaskSpec::new("A")).unwrap();
    assert!(project.needs_reschedule());
    assert!(!project.task(a).unwrap().schedule().scheduled);

    let summary = project.reschedule_now().unwrap();
    assert_eq!(summary.critical_path, vec![a]);
    assert!(project.task(a).unwrap().schedule().scheduled);
}

#[test]
fn rescheduling_is_announced() {
    let mut project = Project::new();
    let events = project.subscribe();
    let a = project.add_task(TaskSpec::new("A")).unwrap();

    let events: Vec<_> = events.try_iter().collect();
    let needs = |flag| ProjectEvent::NeedsRescheduleChanged(flag);
    let raised = events.iter().position(|e| *e == needs(true)).unwrap();
    let cleared = events.iter().position(|e| *e == needs(false)).unwrap();
    assert!(raised < cleared);
    assert!(events.contains(&ProjectEvent::ChildAdded {
        parent: project.root(),
        child: a
    }));
    assert!(matches!(events.last(), Some(ProjectEvent::Rescheduled { critical_count: 1 })));
}

#[test]
fn field_setters_emit_their_field_name() {
    let mut project = Project::new();
    let a = project.add_task(TaskSpec::new("A")).unwrap();
    project.mark_clean();
    let events = project.subscribe();

    project.set_task_name(a, "renamed").unwrap();
    project.set_percent_complete(a, 40).unwrap();
    assert!(project.set_percent_complete(a, 101).is_err());

    let fields: Vec<&str> = events
        .try_iter()
        .filter_map(|event| match event {
            ProjectEvent::TaskFieldChanged { field, .. } => Some(field),
            _ => None,
        })
        .collect();
    assert_eq!(fields, vec!["name", "percent_complete"]);
    assert!(project.is_dirty());
    assert_eq!(project.task(a).unwrap().name(), "renamed");
    assert_eq!(project.task(a).unwrap().percent_complete(), 40);
}

#[test]
fn dropped_subscribers_are_ignored() {
    let mut project = Project::new();
    drop(project.subscribe());
    let kept = project.subscribe();
    project.add_task(TaskSpec::new("A")).unwrap();
    assert!(kept.try_iter().count() > 0);
}
