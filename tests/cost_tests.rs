use cpm_planner::{Project, ResourceKind, SchedulingMode, TaskSpec};

const DAY: i64 = 86_400;

fn fixed_duration(name: &str, days: i64) -> TaskSpec {
    TaskSpec::new(name).duration_days(days).mode(SchedulingMode::FixedDuration)
}

#[test]
fn leaf_cost_uses_units_hours_and_rate() {
    let mut project = Project::new();
    let welder = project.add_resource("welder", ResourceKind::Work, 40.0).unwrap();
    let task = project.add_task(fixed_duration("weld", 2)).unwrap();
    project.assign(task, welder, 50).unwrap();

    // 0.5 * 48h * 40
    assert_eq!(project.task_cost(task).unwrap(), 960.0);
    assert_eq!(project.task(task).unwrap().cached_cost(), Some(960.0));
}

#[test]
fn summary_cost_sums_children() {
    let mut project = Project::new();
    let welder = project.add_resource("welder", ResourceKind::Work, 40.0).unwrap();
    let fitter = project.add_resource("fitter", ResourceKind::Work, 25.0).unwrap();
    let phase = project.add_task(TaskSpec::new("phase")).unwrap();
    let a = project.insert_child(phase, None, fixed_duration("a", 1)).unwrap();
    let b = project.insert_child(phase, None, fixed_duration("b", 1)).unwrap();
    project.assign(a, welder, 100).unwrap();
    project.assign(b, fitter, 100).unwrap();
    project.assign(b, welder, 50).unwrap();

    assert_eq!(project.task_cost(a).unwrap(), 960.0);
    assert_eq!(project.task_cost(b).unwrap(), 600.0 + 480.0);
    assert_eq!(project.task_cost(phase).unwrap(), 960.0 + 1080.0);
    assert_eq!(project.project_cost().unwrap(), 2040.0);
}

#[test]
fn unit_change_invalidates_ancestors_but_not_siblings() {
    let mut project = Project::new();
    let welder = project.add_resource("welder", ResourceKind::Work, 40.0).unwrap();
    let left = project.add_task(TaskSpec::new("left")).unwrap();
    let right = project.add_task(TaskSpec::new("right")).unwrap();
    let left_leaf = project.insert_child(left, None, fixed_duration("left leaf", 1)).unwrap();
    let right_leaf = project.insert_child(right, None, fixed_duration("right leaf", 1)).unwrap();
    let assignment = project.assign(left_leaf, welder, 100).unwrap();
    project.assign(right_leaf, welder, 100).unwrap();
    project.project_cost().unwrap();

    project.set_assignment_units(assignment, 50).unwrap();

    assert_eq!(project.task(left_leaf).unwrap().cached_cost(), None);
    assert_eq!(project.task(left).unwrap().cached_cost(), None);
    assert_eq!(project.task(project.root()).unwrap().cached_cost(), None);
    assert_eq!(project.task(right).unwrap().cached_cost(), Some(960.0));
    assert_eq!(project.task(right_leaf).unwrap().cached_cost(), Some(960.0));

    assert_eq!(project.project_cost().unwrap(), 480.0 + 960.0);
}

#[test]
fn rate_change_invalidates_assigned_tasks() {
    let mut project = Project::new();
    let welder = project.add_resource("welder", ResourceKind::Work, 40.0).unwrap();
    let task = project.add_task(fixed_duration("weld", 1)).unwrap();
    project.assign(task, welder, 100).unwrap();
    assert_eq!(project.task_cost(task).unwrap(), 960.0);

    project.set_resource_cost(welder, 10.0).unwrap();
    assert_eq!(project.task(task).unwrap().cached_cost(), None);
    assert_eq!(project.task_cost(task).unwrap(), 240.0);
}

#[test]
fn unassigning_drops_the_cost() {
    let mut project = Project::new();
    let welder = project.add_resource("welder", ResourceKind::Work, 40.0).unwrap();
    let task = project.add_task(fixed_duration("weld", 1)).unwrap();
    project.assign(task, welder, 100).unwrap();
    project.task_cost(task).unwrap();
    project.unassign(task, welder).unwrap();
    assert_eq!(project.task_cost(task).unwrap(), 0.0);
}

#[test]
fn negative_rates_and_bad_units_are_rejected() {
    let mut project = Project::new();
    assert!(project.add_resource("broken", ResourceKind::Work, -1.0).is_err());
    let welder = project.add_resource("welder", ResourceKind::Work, 40.0).unwrap();
    let task = project.add_task(TaskSpec::new("weld")).unwrap();
    assert!(project.assign(task, welder, 0).is_err());
    assert!(project.assign(task, welder, 10_001).is_err());
    assert!(project.task(task).unwrap().assignments().is_empty());
}

#[test]
fn fixed_work_shortens_duration_with_more_units() {
    let mut project = Project::new();
    let crew = project.add_resource("crew", ResourceKind::Work, 0.0).unwrap();
    let task = project.add_task(TaskSpec::new("dig").duration_days(4)).unwrap();
    assert_eq!(project.task(task).unwrap().work(), 4 * DAY);

    project.assign(task, crew, 200).unwrap();
    let record = project.task(task).unwrap();
    assert_eq!(record.work(), 4 * DAY);
    assert_eq!(record.duration(), 2 * DAY);
}

#[test]
fn fixed_duration_scales_work_with_units() {
    let mut project = Project::new();
    let crew = project.add_resource("crew", ResourceKind::Work, 0.0).unwrap();
    let task = project.add_task(fixed_duration("dig", 4)).unwrap();
    project.assign(task, crew, 50).unwrap();
    let record = project.task(task).unwrap();
    assert_eq!(record.duration(), 4 * DAY);
    assert_eq!(record.work(), 2 * DAY);
}

#[test]
fn fixed_units_derives_duration_from_work() {
    let mut project = Project::new();
    let crew = project.add_resource("crew", ResourceKind::Work, 0.0).unwrap();
    let task = project
        .add_task(TaskSpec::new("dig").duration_days(2).mode(SchedulingMode::FixedUnits))
        .unwrap();
    project.assign(task, crew, 200).unwrap();
    assert_eq!(project.task(task).unwrap().work(), 4 * DAY);

    project.set_work(task, 8 * DAY).unwrap();
    assert_eq!(project.task(task).unwrap().duration(), 4 * DAY);
}

#[test]
fn material_resources_do_not_count_towards_units() {
    let mut project = Project::new();
    let steel = project.add_resource("steel", ResourceKind::Material, 5.0).unwrap();
    let task = project.add_task(TaskSpec::new("weld").duration_days(1)).unwrap();
    project.assign(task, steel, 300).unwrap();
    assert_eq!(project.total_units(task).unwrap(), 100);
    assert_eq!(project.task(task).unwrap().duration(), DAY);
}
