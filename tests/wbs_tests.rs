use cpm_planner::{
    EntityRef, Project, ProjectEvent, RelationType, ResourceKind, ScheduleError, TaskSpec, TaskType,
};

#[test]
fn outline_numbers_follow_sibling_order() {
    let mut project = Project::new();
    let design = project.add_task(TaskSpec::new("design")).unwrap();
    let build = project.add_task(TaskSpec::new("build")).unwrap();
    let frame = project.insert_child(build, None, TaskSpec::new("frame")).unwrap();
    let walls = project.insert_child(build, None, TaskSpec::new("walls")).unwrap();
    let survey = project.insert_child(build, Some(0), TaskSpec::new("survey")).unwrap();

    assert_eq!(project.wbs_id(design).unwrap(), "1");
    assert_eq!(project.wbs_id(build).unwrap(), "2");
    assert_eq!(project.wbs_id(survey).unwrap(), "2.1");
    assert_eq!(project.wbs_id(frame).unwrap(), "2.2");
    assert_eq!(project.wbs_id(walls).unwrap(), "2.3");
    assert_eq!(
        project.pre_order(build).unwrap(),
        vec![build, survey, frame, walls]
    );
    assert_eq!(
        project.post_order(build).unwrap(),
        vec![survey, frame, walls, build]
    );
    assert_eq!(project.leaves(), vec![design, survey, frame, walls]);
}

#[test]
fn milestone_gaining_a_child_becomes_normal() {
    let mut project = Project::new();
    let gate = project.add_task(TaskSpec::milestone("gate")).unwrap();
    assert_eq!(project.task(gate).unwrap().task_type(), TaskType::Milestone);
    project.insert_child(gate, None, TaskSpec::new("check")).unwrap();
    assert_eq!(project.task(gate).unwrap().task_type(), TaskType::Normal);
}

#[test]
fn summary_task_cannot_become_a_milestone() {
    let mut project = Project::new();
    let phase = project.add_task(TaskSpec::new("phase").duration_days(1)).unwrap();
    project
        .insert_child(phase, None, TaskSpec::new("pour").duration_days(2))
        .unwrap();
    let events = project.subscribe();

    assert!(matches!(
        project.set_task_type(phase, TaskType::Milestone).unwrap_err(),
        ScheduleError::InvalidOperation(_)
    ));
    let phase = project.task(phase).unwrap();
    assert_eq!(phase.task_type(), TaskType::Normal);
    assert!(phase.finish() > phase.start());
    assert_eq!(events.try_iter().count(), 0);
}

#[test]
fn leaf_task_turned_milestone_collapses_to_an_instant() {
    let mut project = Project::new();
    let gate = project.add_task(TaskSpec::new("gate").duration_days(2)).unwrap();
    project.set_task_type(gate, TaskType::Milestone).unwrap();
    let gate = project.task(gate).unwrap();
    assert!(gate.is_milestone());
    assert_eq!(gate.duration(), 0);
    assert_eq!(gate.finish(), gate.start());
}

#[test]
fn task_gaining_a_child_loses_its_assignments() {
    let mut project = Project::new();
    let crew = project.add_resource("crew", ResourceKind::Work, 20.0).unwrap();
    let parent = project.add_task(TaskSpec::new("parent")).unwrap();
    let assignment = project.assign(parent, crew, 100).unwrap();
    let events = project.subscribe();

    let child = project.insert_child(parent, None, TaskSpec::new("child")).unwrap();

    assert!(project.task(parent).unwrap().assignments().is_empty());
    assert_eq!(project.resource_assignments(crew).count(), 0);
    let events: Vec<_> = events.try_iter().collect();
    assert!(events.contains(&ProjectEvent::AssignmentRemoved {
        assignment,
        task: parent,
        resource: crew
    }));
    assert!(events.contains(&ProjectEvent::ChildAdded { parent, child }));

    assert!(matches!(
        project.assign(parent, crew, 100).unwrap_err(),
        ScheduleError::InvalidOperation(_)
    ));
}

#[test]
fn removing_a_subtree_leaves_no_dangling_edges() {
    let mut project = Project::new();
    let crew = project.add_resource("crew", ResourceKind::Work, 20.0).unwrap();
    let before = project.add_task(TaskSpec::new("before")).unwrap();
    let phase = project.add_task(TaskSpec::new("phase")).unwrap();
    let inner_a = project.insert_child(phase, None, TaskSpec::new("inner a")).unwrap();
    let inner_b = project.insert_child(phase, None, TaskSpec::new("inner b")).unwrap();
    let after = project.add_task(TaskSpec::new("after")).unwrap();
    project.add_predecessor(inner_a, before, RelationType::FS, 0).unwrap();
    project.add_predecessor(inner_b, inner_a, RelationType::FS, 0).unwrap();
    project.add_predecessor(after, phase, RelationType::FS, 0).unwrap();
    project.assign(inner_b, crew, 100).unwrap();
    let events = project.subscribe();

    let removed = project.remove_subtree(phase).unwrap();

    assert_eq!(removed, vec![inner_a, inner_b, phase]);
    assert_eq!(project.relations().count(), 0);
    assert_eq!(project.resource_assignments(crew).count(), 0);
    for survivor in [before, after] {
        let task = project.task(survivor).unwrap();
        assert!(task.predecessors().is_empty());
        assert!(task.successors().is_empty());
        for gone in &removed {
            assert!(!project.has_relation(survivor, *gone));
        }
    }
    for gone in &removed {
        assert!(project.get_task(*gone).is_none());
        assert!(project.ids().lookup(gone.raw()).is_none());
    }
    assert_eq!(project.task(after).unwrap().start(), project.project_start());

    let events: Vec<_> = events.try_iter().collect();
    assert!(events.contains(&ProjectEvent::Removed(EntityRef::Task(phase))));
    assert!(events.contains(&ProjectEvent::ChildRemoved { parent: phase, child: inner_a }));
}

#[test]
fn root_cannot_be_removed_or_moved() {
    let mut project = Project::new();
    let root = project.root();
    let task = project.add_task(TaskSpec::new("task")).unwrap();
    assert!(project.remove_subtree(root).is_err());
    assert!(project.reattach(root, task, None).is_err());
}

#[test]
fn reattach_moves_the_subtree() {
    let mut project = Project::new();
    let phase = project.add_task(TaskSpec::new("phase")).unwrap();
    let other = project.add_task(TaskSpec::new("other")).unwrap();
    let inner = project.insert_child(phase, None, TaskSpec::new("inner")).unwrap();
    let sibling = project.insert_child(phase, None, TaskSpec::new("sibling")).unwrap();

    project.reattach(inner, other, None).unwrap();

    assert_eq!(project.task(inner).unwrap().parent(), Some(other));
    assert_eq!(project.task(phase).unwrap().children(), &[sibling]);
    assert_eq!(project.wbs_id(inner).unwrap(), "2.1");
}

#[test]
fn reattach_into_own_subtree_fails() {
    let mut project = Project::new();
    let phase = project.add_task(TaskSpec::new("phase")).unwrap();
    let inner = project.insert_child(phase, None, TaskSpec::new("inner")).unwrap();
    assert!(matches!(
        project.reattach(phase, inner, None).unwrap_err(),
        ScheduleError::InvalidOperation(_)
    ));
    assert!(project.reattach(phase, phase, None).is_err());
}

#[test]
fn reattach_that_closes_a_cycle_is_rolled_back() {
    let mut project = Project::new();
    let phase = project.add_task(TaskSpec::new("phase")).unwrap();
    let inner = project.insert_child(phase, None, TaskSpec::new("inner")).unwrap();
    let follower = project.add_task(TaskSpec::new("follower")).unwrap();
    project.add_predecessor(follower, phase, RelationType::FS, 0).unwrap();

    let err = project.reattach(follower, phase, None).unwrap_err();
    assert!(matches!(err, ScheduleError::CyclicDependency { .. }));
    assert_eq!(project.task(follower).unwrap().parent(), Some(project.root()));
    assert_eq!(project.task(phase).unwrap().children(), &[inner]);
    assert_eq!(project.wbs_id(follower).unwrap(), "2");
}
