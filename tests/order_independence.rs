// tests/order_independence.rs

use std::collections::{BTreeSet, HashMap};

use proptest::prelude::*;
use taskdag::TaskScheduler;
use taskdag_test_utils::tasks::echo;

/// Random DAG: task `i` may only depend on tasks `0..i`, so it is acyclic.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<BTreeSet<usize>>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..4),
            num_tasks,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, picks)| {
                    if i == 0 {
                        BTreeSet::new()
                    } else {
                        picks.into_iter().map(|p| p % i).collect()
                    }
                })
                .collect::<Vec<_>>()
        })
    })
}

fn name(i: usize) -> String {
    format!("t{i}")
}

/// What `echo` produces for each task, computed in index order.
fn expected_values(deps: &[BTreeSet<usize>]) -> HashMap<String, String> {
    let mut values: HashMap<String, String> = HashMap::new();
    for (i, task_deps) in deps.iter().enumerate() {
        let mut args: Vec<(String, String)> = task_deps
            .iter()
            .map(|d| (name(*d), values[&name(*d)].clone()))
            .collect();
        args.sort();
        let args: Vec<String> = args.iter().map(|(k, v)| format!("{k}={v}")).collect();
        values.insert(name(i), format!("{}({})", name(i), args.join(",")));
    }
    values
}

fn run(deps: &[BTreeSet<usize>], order: &[usize]) -> HashMap<String, String> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    rt.block_on(async {
        let mut scheduler = TaskScheduler::new();
        for &i in order {
            let task_name = name(i);
            let dep_names: Vec<String> = deps[i].iter().map(|d| name(*d)).collect();
            let dep_refs: Vec<&str> = dep_names.iter().map(String::as_str).collect();
            scheduler
                .add_task(&task_name, echo(&task_name), &dep_refs)
                .unwrap();
        }
        scheduler.start().unwrap().await.unwrap()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn registration_order_does_not_change_results(
        (deps, order) in dag_strategy(8).prop_flat_map(|deps| {
            let indices: Vec<usize> = (0..deps.len()).collect();
            (Just(deps), Just(indices).prop_shuffle())
        })
    ) {
        let results = run(&deps, &order);

        prop_assert_eq!(results.len(), deps.len());
        prop_assert_eq!(results, expected_values(&deps));
    }
}
