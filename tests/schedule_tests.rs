use chrono::Weekday;
use cpm_planner::{
    Constraint, ConstraintType, DayId, Project, ProjectMetadata, RelationType, ResourceKind,
    ScheduleError, SchedulerConfig, TaskId, TaskSpec, TimeValue,
};

const DAY: i64 = 86_400;

fn at(y: i32, m: u32, d: u32, h: u32) -> TimeValue {
    TimeValue::compose(y, m, d, h, 0, 0).unwrap()
}

fn assert_invariants(project: &Project) {
    for task in project.tasks() {
        assert!(task.finish() >= task.start(), "task {} finishes before it starts", task.id());
        assert!(task.slack() >= 0, "task {} has negative slack", task.id());
        assert_eq!(task.is_critical(), task.slack() == 0, "task {}", task.id());
        if task.is_milestone() {
            assert_eq!(task.finish(), task.start());
        }
    }
    for relation in project.relations() {
        if relation.relation_type() != RelationType::FS {
            continue;
        }
        let pred = project.task(relation.predecessor()).unwrap();
        let succ = project.task(relation.successor()).unwrap();
        assert!(succ.start() >= pred.finish().offset(relation.lag()));
    }
}

/// A (2d) -> B (3d), with C (1d) running alongside.
fn chain() -> (Project, TaskId, TaskId, TaskId) {
    let mut project = Project::new();
    let a = project.add_task(TaskSpec::new("A").duration_days(2)).unwrap();
    let b = project.add_task(TaskSpec::new("B").duration_days(3)).unwrap();
    let c = project.add_task(TaskSpec::new("C").duration_days(1)).unwrap();
    project.add_predecessor(b, a, RelationType::FS, 0).unwrap();
    (project, a, b, c)
}

#[test]
fn finish_to_start_across_working_days() {
    let mut project = Project::new();
    let p = project.add_task(TaskSpec::new("P").duration_days(3)).unwrap();
    let s = project.add_task(TaskSpec::new("S").duration_days(2)).unwrap();
    project.add_predecessor(s, p, RelationType::FS, 0).unwrap();

    let (p, s) = (project.task(p).unwrap(), project.task(s).unwrap());
    assert_eq!(p.start(), at(2025, 1, 6, 0));
    // Three full working days end as Wednesday closes.
    assert_eq!(p.finish(), at(2025, 1, 9, 0));
    assert_eq!(s.start(), p.finish());
    assert_eq!(s.finish(), at(2025, 1, 11, 0));
    assert_invariants(&project);
}

#[test]
fn successor_takes_the_latest_relation_bound() {
    let mut project = Project::new();
    let p1 = project.add_task(TaskSpec::new("P1").duration_days(3)).unwrap();
    let p2 = project.add_task(TaskSpec::new("P2").duration_days(1)).unwrap();
    let s = project.add_task(TaskSpec::new("S")).unwrap();
    project.add_predecessor(s, p1, RelationType::FS, 0).unwrap();
    let ss = project.add_predecessor(s, p2, RelationType::SS, 4 * DAY).unwrap();

    // FS bound: Thursday 00:00; SS bound: Monday + 4 days = Friday 00:00.
    assert_eq!(project.task(s).unwrap().start(), at(2025, 1, 10, 0));

    project.set_relation_lag(ss, DAY).unwrap();
    assert_eq!(project.task(s).unwrap().start(), at(2025, 1, 9, 0));
    assert_invariants(&project);
}

#[test]
fn slack_and_criticality() {
    let (project, a, b, c) = chain();
    let (a, b, c) = (project.task(a).unwrap(), project.task(b).unwrap(), project.task(c).unwrap());

    assert_eq!(b.finish(), at(2025, 1, 11, 0));
    assert!(a.is_critical());
    assert!(b.is_critical());
    assert!(!c.is_critical());
    assert_eq!(c.latest_start(), at(2025, 1, 10, 0));
    assert_eq!(c.latest_finish(), at(2025, 1, 11, 0));
    assert_eq!(c.slack(), 4 * DAY);
    assert_eq!(project.critical_path(), vec![a.id(), b.id()]);
    assert_invariants(&project);
}

#[test]
fn start_to_start_late_dates() {
    let mut project = Project::new();
    let p = project.add_task(TaskSpec::new("P").duration_days(5)).unwrap();
    let s = project.add_task(TaskSpec::new("S").duration_days(1)).unwrap();
    project.add_predecessor(s, p, RelationType::SS, 0).unwrap();

    let s_task = project.task(s).unwrap();
    assert_eq!(s_task.start(), at(2025, 1, 6, 0));
    assert_eq!(s_task.latest_start(), at(2025, 1, 10, 0));
    assert_eq!(s_task.latest_finish(), at(2025, 1, 11, 0));
    assert_eq!(s_task.slack(), 4 * DAY);
    assert!(project.task(p).unwrap().is_critical());
    assert_invariants(&project);

    // A short predecessor is held back by its successor's latest start.
    let mut project = Project::new();
    let p = project.add_task(TaskSpec::new("P").duration_days(1)).unwrap();
    let s = project.add_task(TaskSpec::new("S").duration_days(3)).unwrap();
    project.add_predecessor(s, p, RelationType::SS, 0).unwrap();

    let p = project.task(p).unwrap();
    assert_eq!(p.latest_start(), at(2025, 1, 6, 0));
    assert_eq!(p.latest_finish(), at(2025, 1, 7, 0));
    assert_eq!(p.slack(), 0);
    assert!(project.task(s).unwrap().is_critical());
    assert_invariants(&project);
}

#[test]
fn finish_to_finish_late_dates() {
    let mut project = Project::new();
    let p = project.add_task(TaskSpec::new("P").duration_days(1)).unwrap();
    let s = project.add_task(TaskSpec::new("S").duration_days(1)).unwrap();
    project.add_predecessor(s, p, RelationType::FF, DAY).unwrap();

    let s_task = project.task(s).unwrap();
    assert_eq!(s_task.start(), at(2025, 1, 7, 0));
    assert_eq!(s_task.finish(), at(2025, 1, 8, 0));
    assert_eq!(s_task.slack(), 0);

    // P must finish a day before S may finish at the latest.
    let p = project.task(p).unwrap();
    assert_eq!(p.latest_finish(), at(2025, 1, 7, 0));
    assert_eq!(p.latest_start(), at(2025, 1, 6, 0));
    assert_eq!(p.slack(), 0);
    assert!(p.is_critical());
    assert_invariants(&project);
}

#[test]
fn start_to_finish_late_dates() {
    let mut project = Project::new();
    let p = project.add_task(TaskSpec::new("P").duration_days(1)).unwrap();
    let s = project.add_task(TaskSpec::new("S").duration_days(1)).unwrap();
    project
        .set_constraint(p, Constraint::start_no_earlier_than(at(2025, 1, 8, 0)))
        .unwrap();
    project.add_predecessor(s, p, RelationType::SF, 3 * DAY).unwrap();

    // S finishes no earlier than P's start plus three days: Saturday 00:00.
    let s_task = project.task(s).unwrap();
    assert_eq!(s_task.start(), at(2025, 1, 10, 0));
    assert_eq!(s_task.finish(), at(2025, 1, 11, 0));
    assert_eq!(s_task.slack(), 0);

    let p = project.task(p).unwrap();
    assert_eq!(p.start(), at(2025, 1, 8, 0));
    assert_eq!(p.latest_finish(), at(2025, 1, 9, 0));
    assert_eq!(p.latest_start(), at(2025, 1, 8, 0));
    assert_eq!(p.slack(), 0);
    assert_invariants(&project);
}

#[test]
fn summary_is_critical_iff_a_leaf_has_zero_slack() {
    let mut project = Project::new();
    let main = project.add_task(TaskSpec::new("main line")).unwrap();
    let side = project.add_task(TaskSpec::new("side line")).unwrap();
    let a = project.insert_child(main, None, TaskSpec::new("A").duration_days(2)).unwrap();
    let b = project.insert_child(main, None, TaskSpec::new("B").duration_days(3)).unwrap();
    let c = project.insert_child(side, None, TaskSpec::new("C").duration_days(1)).unwrap();
    project.add_predecessor(b, a, RelationType::FS, 0).unwrap();

    for summary in [main, side] {
        let record = project.task(summary).unwrap();
        let any_leaf_critical = project
            .leaf_descendants(summary)
            .unwrap()
            .into_iter()
            .any(|leaf| project.task(leaf).unwrap().slack() == 0);
        assert_eq!(record.is_critical(), any_leaf_critical);
    }
    assert!(project.task(main).unwrap().is_critical());
    assert!(!project.task(side).unwrap().is_critical());
    assert_eq!(project.task(side).unwrap().slack(), project.task(c).unwrap().slack());
    assert_invariants(&project);
}

#[test]
fn summary_rolls_up_dates_and_work() {
    let mut project = Project::new();
    let phase = project.add_task(TaskSpec::new("phase")).unwrap();
    let a = project.insert_child(phase, None, TaskSpec::new("A").duration_days(2)).unwrap();
    let b = project.insert_child(phase, None, TaskSpec::new("B").duration_days(3)).unwrap();
    project.add_predecessor(b, a, RelationType::FS, 0).unwrap();

    let summary = project.task(phase).unwrap();
    assert!(summary.is_summary());
    assert_eq!(summary.start(), at(2025, 1, 6, 0));
    assert_eq!(summary.finish(), at(2025, 1, 11, 0));
    assert_eq!(summary.duration(), 5 * DAY);
    assert_eq!(summary.work(), 5 * DAY);
}

#[test]
fn summary_predecessor_binds_every_leaf() {
    let mut project = Project::new();
    let first = project.add_task(TaskSpec::new("first").duration_days(2)).unwrap();
    let phase = project.add_task(TaskSpec::new("phase")).unwrap();
    let x = project.insert_child(phase, None, TaskSpec::new("X")).unwrap();
    let y = project.insert_child(phase, None, TaskSpec::new("Y")).unwrap();
    project.add_predecessor(phase, first, RelationType::FS, 0).unwrap();

    for leaf in [x, y] {
        assert_eq!(project.task(leaf).unwrap().start(), at(2025, 1, 8, 0));
    }
    assert_invariants(&project);
}

#[test]
fn milestones_sit_at_their_predecessor_finish() {
    let (mut project, _, b, _) = chain();
    let done = project.add_task(TaskSpec::milestone("done")).unwrap();
    project.add_predecessor(done, b, RelationType::FS, 0).unwrap();

    let done = project.task(done).unwrap();
    assert_eq!(done.duration(), 0);
    assert_eq!(done.start(), at(2025, 1, 11, 0));
    assert_eq!(done.finish(), done.start());
    assert!(done.is_critical());
    assert_invariants(&project);
}

#[test]
fn milestone_rejects_a_duration() {
    let mut project = Project::new();
    let gate = project.add_task(TaskSpec::milestone("gate")).unwrap();
    assert!(matches!(
        project.set_duration(gate, DAY).unwrap_err(),
        ScheduleError::InvalidValue(_)
    ));
}

#[test]
fn alap_task_is_placed_at_its_latest_dates() {
    let (mut project, _, b, c) = chain();
    let horizon = project.task(b).unwrap().finish();
    project.set_constraint(c, Constraint::alap()).unwrap();

    let c = project.task(c).unwrap();
    assert_eq!(c.start(), at(2025, 1, 10, 0));
    assert_eq!(c.finish(), horizon);
    assert_eq!(project.task(b).unwrap().finish(), horizon);
    assert_invariants(&project);
}

#[test]
fn start_no_earlier_than_delays_the_task() {
    let (mut project, _, _, c) = chain();
    project
        .set_constraint(c, Constraint::start_no_earlier_than(at(2025, 1, 8, 12)))
        .unwrap();
    let c = project.task(c).unwrap();
    assert_eq!(c.start(), at(2025, 1, 8, 12));
    assert_eq!(c.finish(), at(2025, 1, 9, 12));
}

#[test]
fn must_start_on_moves_the_task_when_feasible() {
    let (mut project, _, _, c) = chain();
    project.set_constraint(c, Constraint::must_start_on(at(2025, 1, 9, 0))).unwrap();
    assert_eq!(project.task(c).unwrap().start(), at(2025, 1, 9, 0));
}

#[test]
fn must_start_on_conflict_keeps_the_last_valid_schedule() {
    let (mut project, a, b, _) = chain();
    let before = *project.task(b).unwrap().schedule();

    let err = project
        .set_constraint(b, Constraint::must_start_on(at(2025, 1, 6, 0)))
        .unwrap_err();
    assert!(matches!(err, ScheduleError::SchedulingConflict { task, .. } if task == b));

    let record = project.task(b).unwrap();
    assert_eq!(record.constraint().kind, ConstraintType::MustStartOn);
    assert_eq!(record.start(), before.start);
    assert_eq!(record.finish(), before.finish);
    // The rest of the graph still schedules.
    assert_eq!(project.task(a).unwrap().start(), at(2025, 1, 6, 0));
    let summary = project.last_summary().unwrap();
    assert_eq!(summary.conflicts.len(), 1);
    assert_eq!(summary.conflicts[0].task, b);
}

#[test]
fn finish_no_later_than_is_reported() {
    let (mut project, a, _, _) = chain();
    let err = project
        .set_constraint(a, Constraint::finish_no_later_than(at(2025, 1, 7, 0)))
        .unwrap_err();
    assert!(matches!(err, ScheduleError::SchedulingConflict { task, .. } if task == a));
}

#[test]
fn abort_mode_commits_nothing_on_conflict() {
    let config = SchedulerConfig {
        abort_on_conflict: true,
        ..SchedulerConfig::default()
    };
    let mut project = Project::with_config(ProjectMetadata::default(), config);
    let a = project.add_task(TaskSpec::new("A").duration_days(2)).unwrap();
    let b = project.add_task(TaskSpec::new("B")).unwrap();
    project.add_predecessor(b, a, RelationType::FS, 0).unwrap();
    let before = *project.task(b).unwrap().schedule();

    let err = project
        .set_constraint(b, Constraint::must_start_on(at(2025, 1, 6, 0)))
        .unwrap_err();
    assert!(matches!(err, ScheduleError::SchedulingConflict { .. }));
    assert_eq!(*project.task(b).unwrap().schedule(), before);
    assert!(project.needs_reschedule());
    assert!(project.reschedule_now().is_err());
}

#[test]
fn project_start_moves_everything() {
    let (mut project, a, b, _) = chain();
    project.set_project_start(at(2025, 1, 8, 0)).unwrap();
    assert_eq!(project.task(a).unwrap().start(), at(2025, 1, 8, 0));
    // A: Wed-Thu, B: Fri + Mon-Tue.
    assert_eq!(project.task(b).unwrap().start(), at(2025, 1, 10, 0));
    assert_eq!(project.task(b).unwrap().finish(), at(2025, 1, 15, 0));
    assert_invariants(&project);
}

#[test]
fn resource_calendar_drives_its_tasks() {
    let mut project = Project::new();
    let root = project.calendars().root();
    let weekend = project.derive_calendar("six days", root).unwrap();
    project.set_default_day(weekend, Weekday::Sat, DayId::WORK).unwrap();
    let crew = project.add_resource("crew", ResourceKind::Work, 10.0).unwrap();
    project.set_resource_calendar(crew, Some(weekend)).unwrap();

    let task = project.add_task(TaskSpec::new("dig").duration_days(6)).unwrap();
    assert_eq!(project.task(task).unwrap().finish(), at(2025, 1, 14, 0));
    project.assign(task, crew, 100).unwrap();
    assert_eq!(project.task(task).unwrap().finish(), at(2025, 1, 12, 0));
}

#[test]
fn priority_scheduling_serializes_shared_resources() {
    let config = SchedulerConfig {
        priority_scheduling: true,
        ..SchedulerConfig::default()
    };
    let mut project = Project::with_config(ProjectMetadata::default(), config);
    let crane = project.add_resource("crane", ResourceKind::Work, 100.0).unwrap();
    let low = project.add_task(TaskSpec::new("low").priority(1)).unwrap();
    let high = project.add_task(TaskSpec::new("high").priority(10)).unwrap();
    project.assign(low, crane, 100).unwrap();
    project.assign(high, crane, 100).unwrap();

    assert_eq!(project.task(high).unwrap().start(), at(2025, 1, 6, 0));
    assert_eq!(project.task(low).unwrap().start(), at(2025, 1, 7, 0));
    assert_invariants(&project);
}

#[test]
fn without_priority_scheduling_resources_overlap() {
    let mut project = Project::new();
    let crane = project.add_resource("crane", ResourceKind::Work, 100.0).unwrap();
    let low = project.add_task(TaskSpec::new("low").priority(1)).unwrap();
    let high = project.add_task(TaskSpec::new("high").priority(10)).unwrap();
    project.assign(low, crane, 100).unwrap();
    project.assign(high, crane, 100).unwrap();
    assert_eq!(project.task(low).unwrap().start(), project.task(high).unwrap().start());
}

#[test]
fn larger_network_keeps_invariants() {
    let mut project = Project::new();
    let mut ids = Vec::new();
    for (index, days) in [2, 1, 4, 3, 1, 2, 5, 1].into_iter().enumerate() {
        ids.push(
            project
                .add_task(TaskSpec::new(format!("T{index}")).duration_days(days))
                .unwrap(),
        );
    }
    let links = [
        (0, 2, RelationType::FS, 0),
        (1, 2, RelationType::FS, DAY / 2),
        (2, 3, RelationType::SS, DAY),
        (3, 5, RelationType::FS, 0),
        (4, 5, RelationType::FS, -DAY / 4),
        (5, 7, RelationType::FS, 0),
        (6, 7, RelationType::FS, 0),
    ];
    for (pred, succ, kind, lag) in links {
        project.add_predecessor(ids[succ], ids[pred], kind, lag).unwrap();
    }
    assert_invariants(&project);
    assert!(!project.critical_path().is_empty());
}
