//! End-to-end pipeline tests: raw trace bytes through model construction,
//! bottom-up aggregation, layout, and spatial lookup.

use cinder_core::model::bottom_up::bottom_up;
use cinder_core::model::cpu::CpuModel;
use cinder_core::model::heap::HeapModel;
use cinder_core::{Trace, layout, parse_auto};
use cinder_protocol::{Cell, Direction, box_at, column_for_x, nearest_at_depth};

const CPU_TRACE: &str = r#"{
    "nodes": [
        {"id":1,"callFrame":{"functionName":"","url":"file:///app/src/index.js","lineNumber":0,"columnNumber":0},"children":[2]},
        {"id":2,"callFrame":{"functionName":"func1","url":"file:///app/src/index.js","lineNumber":4,"columnNumber":10},"children":[3]},
        {"id":3,"callFrame":{"functionName":"Native","lineNumber":-1,"columnNumber":-1}}
    ],
    "samples": [3, 3, 3],
    "timeDeltas": [200000, 400000, 500000],
    "startTime": 100000,
    "endTime": 1200000
}"#;

const HEAP_TRACE: &str = r#"{
    "head": {
        "callFrame": {"functionName":"(root)"},
        "selfSize": 0,
        "children": [
            {"callFrame":{"functionName":"readFile","url":"file:///app/src/io.js","lineNumber":2,"columnNumber":0},
             "selfSize": 8192, "children": []},
            {"callFrame":{"functionName":"render","url":"file:///app/src/ui.js","lineNumber":7,"columnNumber":0},
             "selfSize": 1024,
             "children": [
                {"callFrame":{"functionName":"layout","url":"file:///app/src/ui.js","lineNumber":30,"columnNumber":2},
                 "selfSize": 2048, "children": []}
             ]}
        ]
    },
    "samples": []
}"#;

fn cpu_model() -> CpuModel {
    match parse_auto(CPU_TRACE.as_bytes()) {
        Ok(Trace::Cpu(raw)) => CpuModel::from_trace(&raw, None),
        other => panic!("expected cpu trace, got {other:?}"),
    }
}

fn heap_model() -> HeapModel {
    match parse_auto(HEAP_TRACE.as_bytes()) {
        Ok(Trace::Heap(raw)) => HeapModel::from_trace(&raw, None),
        other => panic!("expected heap trace, got {other:?}"),
    }
}

#[test]
fn cpu_trace_attribution_end_to_end() {
    let model = cpu_model();
    assert!((model.duration - 1_100_000.0).abs() < f64::EPSILON);

    let by_name = |name: &str| {
        model
            .locations
            .iter()
            .find(|l| l.name() == name)
            .unwrap_or_else(|| panic!("missing location {name}"))
    };

    let native = by_name("Native");
    assert!((native.self_time - 900_000.0).abs() < f64::EPSILON);
    assert!((native.aggregate_time - 900_000.0).abs() < f64::EPSILON);

    let func1 = by_name("func1");
    assert!((func1.self_time - 0.0).abs() < f64::EPSILON);
    assert!((func1.aggregate_time - 900_000.0).abs() < f64::EPSILON);

    let anon = by_name("(anonymous)");
    assert!((anon.self_time - 0.0).abs() < f64::EPSILON);
    assert!((anon.aggregate_time - 900_000.0).abs() < f64::EPSILON);
}

#[test]
fn bottom_up_root_conserves_total_self() {
    let cpu = cpu_model();
    let graph = bottom_up(&cpu);
    let total_self: f64 = cpu.nodes.iter().map(|n| n.self_time).sum();
    assert!((graph.aggregate_value - total_self).abs() < 1e-9);

    let heap = heap_model();
    let graph = bottom_up(&heap);
    let total_self: f64 = heap.nodes.iter().map(|n| n.self_size).sum();
    assert!((graph.aggregate_value - total_self).abs() < 1e-9);
}

#[test]
fn double_build_is_identical() {
    let a = cpu_model();
    let b = cpu_model();
    assert_eq!(a.locations.len(), b.locations.len());
    for (x, y) in a.locations.iter().zip(&b.locations) {
        assert_eq!(x.id, y.id);
        assert_eq!(x.name(), y.name());
        assert_eq!(x.category, y.category);
        assert!((x.self_time - y.self_time).abs() < f64::EPSILON);
        assert!((x.aggregate_time - y.aggregate_time).abs() < f64::EPSILON);
    }
    assert_eq!(a.samples, b.samples);
}

#[test]
fn empty_trace_builds_without_error() {
    let json = r#"{"nodes":[],"samples":[],"timeDeltas":[],"startTime":0,"endTime":250}"#;
    let Ok(Trace::Cpu(raw)) = parse_auto(json.as_bytes()) else {
        panic!("expected cpu trace");
    };
    let model = CpuModel::from_trace(&raw, None);
    assert!(model.nodes.is_empty());
    assert!(model.locations.is_empty());
    assert!((model.duration - 250.0).abs() < f64::EPSILON);
    assert!(layout::time_order(&model).columns.is_empty());
}

#[test]
fn heap_layout_and_lookup() {
    let model = heap_model();
    assert!((model.total_size - 11_264.0).abs() < f64::EPSILON);

    let graph = layout::left_heavy(&model);
    let total: f64 = graph.columns.iter().map(|c| c.width()).sum();
    assert!((total - 1.0).abs() < 1e-9);

    // readFile (8192) is the heaviest subtree and lands leftmost.
    let leftmost = box_at(&graph, 0, 1).unwrap();
    let name = model.locations[leftmost.location.index()].name().to_string();
    assert_eq!(name, "readFile");

    // Spatial lookup into the leftmost column.
    let hit = column_for_x(&graph.columns, 0.1).unwrap();
    assert_eq!(hit, 0);
    let b = box_at(&graph, hit, 1).unwrap();
    assert_eq!(b.location, leftmost.location);

    // Query past the right edge reports the insertion point.
    assert_eq!(column_for_x(&graph.columns, 2.0), Err(graph.columns.len()));
}

#[test]
fn merged_runs_resolve_through_one_indirection() {
    // Two identical stacks then a divergent one, with zero-width boundary
    // samples so widths are exact.
    let json = r#"{
        "nodes": [
            {"id":1,"callFrame":{"functionName":"main"},"children":[2,3]},
            {"id":2,"callFrame":{"functionName":"parse"}},
            {"id":3,"callFrame":{"functionName":"emit"}}
        ],
        "samples": [1, 2, 2, 3, 1],
        "timeDeltas": [0, 0, 300, 300, 400],
        "startTime": 0,
        "endTime": 1000
    }"#;
    let Ok(Trace::Cpu(raw)) = parse_auto(json.as_bytes()) else {
        panic!("expected cpu trace");
    };
    let model = CpuModel::from_trace(&raw, None);
    let graph = layout::time_order(&model);

    assert_eq!(graph.columns.len(), 3);
    let total: f64 = graph.columns.iter().map(|c| c.width()).sum();
    assert!((total - 1.0).abs() < 1e-9);

    // The main box is canonical in column 0 and referenced by both others.
    for column in 1..3 {
        assert!(matches!(graph.columns[column].rows[0], Cell::MergedInto(0)));
        let b = box_at(&graph, column, 0).unwrap();
        assert!((b.aggregate_value - 1000.0).abs() < 1e-9);
    }

    // Keyboard navigation: from inside the parse run, the next frame at
    // depth 1 to the right is emit's column.
    let next = nearest_at_depth(&graph, 1, 0.65, Direction::Right);
    assert_eq!(next, Some(2));
    let prev = nearest_at_depth(&graph, 1, 0.55, Direction::Left);
    assert_eq!(prev, Some(0));
}

#[test]
fn filter_deemphasis_marks_rows_below_match() {
    let model = cpu_model();
    let mut graph = layout::time_order(&model);
    let func1 = model
        .locations
        .iter()
        .find(|l| l.name() == "func1")
        .map(|l| l.id)
        .unwrap();

    layout::deemphasize(&mut graph, |loc| loc == func1);

    // Rows above and at the match keep their category; the Native leaf
    // below it is demoted.
    let leaf = box_at(&graph, 0, 2).unwrap();
    assert_eq!(leaf.category, cinder_protocol::Category::Deemphasized);
    let matched = box_at(&graph, 0, 1).unwrap();
    assert_ne!(matched.category, cinder_protocol::Category::Deemphasized);
}
