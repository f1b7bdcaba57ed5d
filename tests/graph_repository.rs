//! Integration tests for the graph repository.
//!
//! Tests verify:
//! - Node and edge CRUD with sequence-assigned ids
//! - Type and endpoint filtering in ascending id order
//! - Referential integrity on edge creation
//! - Cascade deletion of incident edges

mod common;

use agnt::models::EdgeFilter;
use agnt::repository::GraphRepository;
use agnt::AgntError;
use common::builders::props;
use common::harness::TestHarness;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

#[test]
fn test_create_and_get_node() {
    let harness = TestHarness::new();

    let ada = harness
        .graph
        .create_node("person", props(json!({"name": "Ada"})))
        .expect("Should create node");
    assert_eq!(ada.id, 1);

    let fetched = harness.graph.get_node(ada.id).expect("Should get node");
    assert_eq!(fetched, ada);
    assert_eq!(fetched.properties["name"], "Ada");
}

#[test]
fn test_get_missing_node_is_not_found() {
    let harness = TestHarness::new();
    let err = harness.graph.get_node(999).unwrap_err();
    assert!(
        matches!(err, AgntError::NotFound { entity_type: "node", id: 999 }),
        "got {err:?}"
    );
}

#[test]
fn test_list_nodes_filters_by_type_in_id_order() {
    let harness = TestHarness::new();
    for (node_type, name) in [("person", "Ada"), ("city", "London"), ("person", "Charles")] {
        harness
            .graph
            .create_node(node_type, props(json!({ "name": name })))
            .unwrap();
    }

    let people = harness.graph.list_nodes(Some("person")).unwrap();
    let names: Vec<&str> = people
        .iter()
        .map(|n| n.properties["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ada", "Charles"]);

    let all = harness.graph.list_nodes(None).unwrap();
    let ids: Vec<u64> = all.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    assert!(harness.graph.list_nodes(Some("planet")).unwrap().is_empty());
    assert_eq!(harness.graph.list_nodes(Some("")).unwrap().len(), 3);
}

#[test]
fn test_listing_is_repeatable() {
    let harness = TestHarness::new();
    let a = harness.graph.create_node("person", Default::default()).unwrap();
    let b = harness.graph.create_node("person", Default::default()).unwrap();
    harness.graph.create_edge("knows", a.id, b.id).unwrap();
    harness.graph.create_edge("knows", b.id, a.id).unwrap();

    assert_eq!(
        harness.graph.list_nodes(None).unwrap(),
        harness.graph.list_nodes(None).unwrap()
    );
    let filter = EdgeFilter::from_node(a.id);
    assert_eq!(
        harness.graph.list_edges(&filter).unwrap(),
        harness.graph.list_edges(&filter).unwrap()
    );
}

#[test]
fn test_create_node_requires_type() {
    let harness = TestHarness::new();
    let err = harness.graph.create_node("  ", Default::default()).unwrap_err();
    assert!(matches!(err, AgntError::InvalidArgument(_)));
    assert!(harness.graph.list_nodes(None).unwrap().is_empty());
}

#[test]
fn test_edge_filters_combine() {
    let harness = TestHarness::new();
    let ada = harness.graph.create_node("person", Default::default()).unwrap();
    let bob = harness.graph.create_node("person", Default::default()).unwrap();
    let city = harness.graph.create_node("city", Default::default()).unwrap();

    let knows = harness.graph.create_edge("knows", ada.id, bob.id).unwrap();
    let lives = harness.graph.create_edge("lives_in", ada.id, city.id).unwrap();
    let bob_lives = harness.graph.create_edge("lives_in", bob.id, city.id).unwrap();

    assert_eq!(
        harness.graph.list_edges(&EdgeFilter::from_node(ada.id)).unwrap(),
        vec![knows.clone(), lives.clone()]
    );
    assert_eq!(
        harness.graph.list_edges(&EdgeFilter::to_node(city.id)).unwrap(),
        vec![lives.clone(), bob_lives.clone()]
    );
    let filter = EdgeFilter {
        edge_type: "lives_in".into(),
        from_id: bob.id,
        to_id: 0,
    };
    assert_eq!(harness.graph.list_edges(&filter).unwrap(), vec![bob_lives]);
    assert_eq!(harness.graph.get_edge(knows.id).unwrap(), knows);
}

#[test]
fn test_create_edge_with_missing_endpoint_persists_nothing() {
    let harness = TestHarness::new();
    let ada = harness.graph.create_node("person", Default::default()).unwrap();

    let err = harness.graph.create_edge("knows", ada.id, 42).unwrap_err();
    assert!(
        matches!(err, AgntError::Reference { role: "target", id: 42 }),
        "got {err:?}"
    );
    let err = harness.graph.create_edge("knows", 7, ada.id).unwrap_err();
    assert!(matches!(err, AgntError::Reference { role: "source", id: 7 }));

    assert!(harness
        .graph
        .list_edges(&EdgeFilter::default())
        .unwrap()
        .is_empty());

    // Failed creations roll back their id allocation too.
    let edge = harness.graph.create_edge("self", ada.id, ada.id).unwrap();
    assert_eq!(edge.id, 1);
}

#[test]
fn test_delete_node_cascades_to_edges() {
    let harness = TestHarness::new();
    let ada = harness.graph.create_node("person", Default::default()).unwrap();
    let bob = harness.graph.create_node("person", Default::default()).unwrap();
    let eve = harness.graph.create_node("person", Default::default()).unwrap();
    harness.graph.create_edge("knows", ada.id, bob.id).unwrap();
    harness.graph.create_edge("knows", bob.id, ada.id).unwrap();
    let survivor = harness.graph.create_edge("knows", bob.id, eve.id).unwrap();

    harness.graph.delete_node(ada.id).expect("Should delete node");

    assert!(matches!(
        harness.graph.get_node(ada.id),
        Err(AgntError::NotFound { .. })
    ));
    assert_eq!(
        harness.graph.list_edges(&EdgeFilter::default()).unwrap(),
        vec![survivor]
    );
}

#[test]
fn test_ids_are_never_reused() {
    let harness = TestHarness::new();
    let first = harness.graph.create_node("person", Default::default()).unwrap();
    harness.graph.delete_node(first.id).unwrap();
    let second = harness.graph.create_node("person", Default::default()).unwrap();
    assert!(second.id > first.id);

    let harness = harness.reopen();
    let third = harness.graph.create_node("person", Default::default()).unwrap();
    assert!(third.id > second.id);
}

#[test]
fn test_delete_edge_is_unconditional() {
    let harness = TestHarness::new();
    harness.graph.delete_edge(12345).expect("Deleting a missing edge succeeds");

    let a = harness.graph.create_node("person", Default::default()).unwrap();
    let edge = harness.graph.create_edge("knows", a.id, a.id).unwrap();
    harness.graph.delete_edge(edge.id).unwrap();
    assert!(matches!(
        harness.graph.get_edge(edge.id),
        Err(AgntError::NotFound { entity_type: "edge", .. })
    ));
}

#[derive(Debug, Clone)]
enum Op {
    CreateNode,
    CreateEdge(usize, usize),
    DeleteNode(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::CreateNode),
        3 => (0usize..8, 0usize..8).prop_map(|(a, b)| Op::CreateEdge(a, b)),
        1 => (0usize..8).prop_map(Op::DeleteNode),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_deleted_node_leaves_no_edges(ops in prop::collection::vec(op(), 1..40)) {
        let harness = TestHarness::new();
        let mut created: Vec<u64> = Vec::new();
        let mut deleted: Vec<u64> = Vec::new();

        for op in ops {
            match op {
                Op::CreateNode => {
                    created.push(harness.graph.create_node("n", Default::default()).unwrap().id);
                }
                Op::CreateEdge(a, b) if !created.is_empty() => {
                    let from = created[a % created.len()];
                    let to = created[b % created.len()];
                    let result = harness.graph.create_edge("e", from, to);
                    if deleted.contains(&from) || deleted.contains(&to) {
                        let is_reference_error = matches!(result, Err(AgntError::Reference { .. }));
                        prop_assert!(is_reference_error);
                    } else {
                        prop_assert!(result.is_ok());
                    }
                }
                Op::DeleteNode(i) if !created.is_empty() => {
                    let id = created[i % created.len()];
                    harness.graph.delete_node(id).unwrap();
                    deleted.push(id);
                }
                _ => {}
            }

            for id in &deleted {
                prop_assert!(harness.graph.list_edges(&EdgeFilter::from_node(*id)).unwrap().is_empty());
                prop_assert!(harness.graph.list_edges(&EdgeFilter::to_node(*id)).unwrap().is_empty());
            }
        }
    }
}
