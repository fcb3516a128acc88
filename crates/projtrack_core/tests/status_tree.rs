use chrono::NaiveDate;
use projtrack_core::{
    build_tree, select_node, wrapper_choices, ChildRow, Model, NodeType, Project, SelectionView,
    Status, TreeNode, Wrapper,
};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn wrapper(id: &str, status: Status) -> Wrapper {
    Wrapper {
        id: id.to_string(),
        name: id.to_uppercase(),
        status,
    }
}

fn project(id: &str, status: Status, wrapper_id: Option<&str>) -> Project {
    Project {
        id: id.to_string(),
        name: id.to_uppercase(),
        status,
        wrapper_id: wrapper_id.map(str::to_string),
        owner: String::new(),
        start_date: date(2024, 1, 1),
        end_date: date(2024, 2, 1),
        notes: String::new(),
    }
}

/// W1 in progress holding P1, W2 completed and empty, P2 loose and completed.
fn grouping_model() -> Model {
    Model::new(
        vec![
            wrapper("w1", Status::InProgress),
            wrapper("w2", Status::Completed),
        ],
        vec![
            project("p1", Status::InProgress, Some("w1")),
            project("p2", Status::Completed, None),
        ],
    )
}

fn shape(node: &TreeNode) -> (NodeType, String, Vec<(NodeType, String)>) {
    (
        node.node_type,
        node.node_id.clone(),
        node.children
            .iter()
            .map(|child| (child.node_type, child.node_id.clone()))
            .collect(),
    )
}

#[test]
fn groups_wrappers_and_loose_projects_by_status() {
    let tree = build_tree(&grouping_model());

    assert_eq!(tree.roots.len(), 2);
    assert_eq!(
        shape(&tree.roots[0]),
        (
            NodeType::StatusRoot,
            "in_progress".to_string(),
            vec![(NodeType::Wrapper, "w1".to_string())]
        )
    );
    assert_eq!(
        shape(&tree.roots[1]),
        (
            NodeType::StatusRoot,
            "completed".to_string(),
            vec![
                (NodeType::Wrapper, "w2".to_string()),
                (NodeType::Project, "p2".to_string())
            ]
        )
    );

    let w1 = tree.find(NodeType::Wrapper, "w1").unwrap();
    assert_eq!(w1.label, "W1");
    assert_eq!(w1.children.len(), 1);
    assert_eq!(w1.children[0].node_id, "p1");
    assert!(tree.find(NodeType::Wrapper, "w2").unwrap().children.is_empty());
    assert_eq!(tree.node_count(), 6);
}

#[test]
fn wrapper_lists_children_of_every_status() {
    let model = Model::new(
        vec![wrapper("w", Status::InProgress)],
        vec![
            project("done", Status::Completed, Some("w")),
            project("open", Status::InProgress, Some("w")),
        ],
    );

    let tree = build_tree(&model);
    let completed = tree.bucket(Status::Completed).unwrap();
    assert!(completed.children.is_empty());

    let w = tree.find(NodeType::Wrapper, "w").unwrap();
    let ids: Vec<&str> = w.children.iter().map(|c| c.node_id.as_str()).collect();
    assert_eq!(ids, vec!["done", "open"]);
    assert_eq!(w.children[0].status, Status::Completed);
}

#[test]
fn every_entity_appears_exactly_once() {
    let model = Model::new(
        vec![
            wrapper("a", Status::InProgress),
            wrapper("b", Status::Completed),
            wrapper("c", Status::InProgress),
        ],
        vec![
            project("p1", Status::InProgress, Some("a")),
            project("p2", Status::Completed, Some("b")),
            project("p3", Status::Completed, None),
            project("p4", Status::InProgress, None),
            project("p5", Status::Completed, Some("a")),
        ],
    );

    let tree = build_tree(&model);
    assert_eq!(tree.node_count(), 2 + 3 + 5);
    for entity in &model.wrappers {
        assert!(tree.find(NodeType::Wrapper, &entity.id).is_some());
    }
    for entity in &model.projects {
        assert!(tree.find(NodeType::Project, &entity.id).is_some());
    }
}

#[test]
fn building_twice_yields_identical_trees() {
    let model = grouping_model();
    assert_eq!(build_tree(&model), build_tree(&model));
}

#[test]
fn order_inside_a_bucket_follows_collection_order() {
    let model = Model::new(
        vec![
            wrapper("z", Status::InProgress),
            wrapper("a", Status::InProgress),
        ],
        vec![
            project("loose-2", Status::InProgress, None),
            project("loose-1", Status::InProgress, None),
        ],
    );

    let tree = build_tree(&model);
    let ids: Vec<&str> = tree.roots[0]
        .children
        .iter()
        .map(|child| child.node_id.as_str())
        .collect();
    assert_eq!(ids, vec!["z", "a", "loose-2", "loose-1"]);
}

#[test]
fn dangling_project_is_left_out_of_the_tree() {
    let model = Model::new(
        Vec::new(),
        vec![project("orphan", Status::InProgress, Some("ghost"))],
    );

    let tree = build_tree(&model);
    assert!(tree.find(NodeType::Project, "orphan").is_none());
    assert_eq!(tree.node_count(), 2);
}

#[test]
fn selecting_a_bucket_lists_its_direct_children() {
    let model = grouping_model();

    let view = select_node(&model, NodeType::StatusRoot, "completed").unwrap();
    assert_eq!(
        view,
        SelectionView::Children {
            rows: vec![
                ChildRow {
                    node_type: NodeType::Wrapper,
                    id: "w2".to_string(),
                    name: "W2".to_string(),
                    status: Status::Completed,
                },
                ChildRow {
                    node_type: NodeType::Project,
                    id: "p2".to_string(),
                    name: "P2".to_string(),
                    status: Status::Completed,
                },
            ]
        }
    );
    assert!(select_node(&model, NodeType::StatusRoot, "archived").is_none());
}

#[test]
fn selecting_a_wrapper_lists_its_projects() {
    let model = grouping_model();

    match select_node(&model, NodeType::Wrapper, "w1").unwrap() {
        SelectionView::Children { rows } => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].id, "p1");
            assert_eq!(rows[0].node_type, NodeType::Project);
        }
        other => panic!("unexpected view: {other:?}"),
    }
    assert_eq!(
        select_node(&model, NodeType::Wrapper, "w2"),
        Some(SelectionView::Children { rows: Vec::new() })
    );
    assert!(select_node(&model, NodeType::Wrapper, "missing").is_none());
}

#[test]
fn selecting_a_project_returns_its_detail() {
    let model = grouping_model();

    let view = select_node(&model, NodeType::Project, "p1").unwrap();
    assert_eq!(
        view,
        SelectionView::ProjectDetail {
            project: model.projects[0].clone()
        }
    );
    assert!(select_node(&model, NodeType::Project, "w1").is_none());
}

#[test]
fn wrapper_choices_follow_collection_order() {
    let choices = wrapper_choices(&grouping_model());
    assert_eq!(
        choices,
        vec![
            ("w1".to_string(), "W1".to_string()),
            ("w2".to_string(), "W2".to_string())
        ]
    );
}

#[test]
fn tree_serializes_with_snake_case_node_types() {
    let tree = build_tree(&grouping_model());
    let value = serde_json::to_value(&tree).unwrap();
    assert_eq!(value["roots"][0]["node_type"], "status_root");
    assert_eq!(value["roots"][0]["children"][0]["node_type"], "wrapper");
    assert_eq!(value["roots"][1]["children"][1]["status"], "completed");
}
