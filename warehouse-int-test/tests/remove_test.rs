use warehouse::collection::MessageCollection;
use warehouse::query::{all, field};
use warehouse::{metadata, warehouse_message};
use warehouse_int_test::test_util::{cleanup, create_test_context};

#[ctor::ctor]
fn init() {
    colog::init();
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
struct Odometry {
    x: f64,
    y: f64,
    theta: f64,
}

warehouse_message!(Odometry);

fn pose(x: f64) -> Odometry {
    Odometry {
        x,
        y: 0.0,
        theta: 0.0,
    }
}

#[test]
fn test_remove_matching_records() {
    let ctx = create_test_context().unwrap();
    let poses: MessageCollection<Odometry> = ctx.open("poses").unwrap();

    for run in 0..6 {
        poses
            .insert(&pose(run as f64), metadata! { "run": run })
            .unwrap();
    }

    let removed = poses.remove_messages(field("run").lt(3)).unwrap();
    assert_eq!(removed, 3);
    assert_eq!(poses.count().unwrap(), 3);

    // The survivors are exactly the ones the query did not name.
    let remaining = poses.pull_all(all()).unwrap();
    assert!(remaining
        .iter()
        .all(|record| record.metadata().get("run").unwrap().as_i64().unwrap() >= 3));

    cleanup(ctx).unwrap();
}

#[test]
fn test_remove_with_no_match_is_zero_not_error() {
    let ctx = create_test_context().unwrap();
    let poses: MessageCollection<Odometry> = ctx.open("poses").unwrap();
    poses.insert(&pose(1.0), metadata! { "run": 1 }).unwrap();

    let removed = poses.remove_messages(field("run").eq(99)).unwrap();
    assert_eq!(removed, 0);
    assert_eq!(poses.count().unwrap(), 1);

    cleanup(ctx).unwrap();
}

#[test]
fn test_remove_all() {
    let ctx = create_test_context().unwrap();
    let poses: MessageCollection<Odometry> = ctx.open("poses").unwrap();

    for run in 0..4 {
        poses
            .insert(&pose(run as f64), metadata! { "run": run })
            .unwrap();
    }

    let removed = poses.remove_messages(all()).unwrap();
    assert_eq!(removed, 4);
    assert_eq!(poses.count().unwrap(), 0);

    cleanup(ctx).unwrap();
}

#[test]
fn test_insert_after_remove_all_works() {
    let ctx = create_test_context().unwrap();
    let poses: MessageCollection<Odometry> = ctx.open("poses").unwrap();

    poses.insert(&pose(1.0), metadata! { "run": 1 }).unwrap();
    poses.remove_messages(all()).unwrap();
    poses.insert(&pose(2.0), metadata! { "run": 2 }).unwrap();

    let records = poses.pull_all(all()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].message(), Some(&pose(2.0)));

    cleanup(ctx).unwrap();
}
