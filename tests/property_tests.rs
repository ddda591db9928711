use proptest::prelude::*;
use wikigraph::models::Namespace;
use wikigraph::selector::{Operator, Selector};
use wikigraph::source::{MemoryProvider, Table};
use wikigraph::Engine;

const NAMESPACES: [i32; 3] = [0, 1, 14];

#[derive(Debug, Clone)]
struct Wiki {
    namespaces: Vec<i32>,
    memberships: Vec<(usize, usize)>,
    links: Vec<(usize, usize)>,
}

fn arb_wiki() -> impl Strategy<Value = Wiki> {
    (2usize..20).prop_flat_map(|n| {
        (
            prop::collection::vec(prop::sample::select(NAMESPACES.to_vec()), n),
            prop::collection::vec((0..n, 0..n), 0..40),
            prop::collection::vec((0..n, 0..n), 0..40),
        )
            .prop_map(|(namespaces, memberships, links)| Wiki {
                namespaces,
                memberships,
                links,
            })
    })
}

fn title(i: usize) -> String {
    format!("P{}", i)
}

fn build(wiki: &Wiki) -> Engine {
    let pages = wiki.namespaces.iter().enumerate().map(|(i, ns)| {
        let mut row = vec![String::new(); 13];
        row[0] = (i + 1).to_string();
        row[1] = ns.to_string();
        row[2] = title(i);
        row[4] = "0".to_string();
        row
    });
    let memberships = wiki
        .memberships
        .iter()
        .filter(|&&(_, to)| wiki.namespaces[to] == 14)
        .map(|&(from, to)| {
            let mut row = vec![String::new(); 7];
            row[0] = (from + 1).to_string();
            row[1] = title(to);
            row
        });
    let links = wiki.links.iter().map(|&(from, to)| {
        vec![
            (from + 1).to_string(),
            wiki.namespaces[to].to_string(),
            title(to),
            wiki.namespaces[from].to_string(),
        ]
    });
    Engine::new(
        MemoryProvider::new()
            .with_rows(Table::Page, pages)
            .with_rows(Table::CategoryLinks, memberships)
            .with_rows(Table::PageLinks, links),
    )
}

fn arb_selector(n: usize) -> impl Strategy<Value = Selector> {
    prop_oneof![
        prop::sample::select(vec![Namespace::Main, Namespace::Talk, Namespace::Category])
            .prop_map(Selector::in_namespace),
        (0..n).prop_map(|i| Selector::linking_to_page(Namespace::Main, &title(i))),
        Just(Selector::in_matching_categories("P[0-9]*[02468]$").unwrap()),
    ]
}

fn arb_operator() -> impl Strategy<Value = Operator> {
    prop::sample::select(vec![
        Operator::Replace,
        Operator::Add,
        Operator::Subtract,
        Operator::ReverseSubtract,
        Operator::Intersect,
    ])
}

fn arb_session() -> impl Strategy<Value = (Wiki, Vec<(Operator, Selector)>)> {
    arb_wiki().prop_flat_map(|wiki| {
        let n = wiki.namespaces.len();
        let ops = prop::collection::vec((arb_operator(), arb_selector(n)), 1..12);
        (Just(wiki), ops)
    })
}

/// Page-link targets outside Main may not exist, so only valid selectors are applied.
fn applicable(engine: &Engine, selector: &Selector) -> bool {
    match selector {
        Selector::LinkingToPage { namespace, title } => {
            engine.store().lookup(*namespace, title).is_some()
        }
        _ => true,
    }
}

proptest! {
    #[test]
    fn prop_intersect_shrinks_and_add_grows((wiki, ops) in arb_session()) {
        let mut engine = build(&wiki);
        engine.load_page_links().unwrap();
        engine.load_category_links().unwrap();

        for (operator, selector) in ops {
            if !applicable(&engine, &selector) {
                continue;
            }
            let before = engine.working_set().clone();
            let matched = engine.operate(operator, &selector).unwrap();
            let after = engine.working_set();
            match operator {
                Operator::Intersect | Operator::Subtract => {
                    prop_assert!(after.len() <= before.len());
                    prop_assert!(after.is_subset(&before));
                }
                Operator::Add => {
                    prop_assert!(after.len() >= before.len());
                    prop_assert!(before.is_subset(after));
                }
                Operator::Replace => prop_assert_eq!(after.len(), matched),
                Operator::ReverseSubtract => prop_assert!(after.is_disjoint(&before)),
            }
        }
    }

    #[test]
    fn prop_replace_then_subtract_is_empty((wiki, ops) in arb_session()) {
        let mut engine = build(&wiki);
        engine.load_page_links().unwrap();
        for (_, selector) in ops {
            if !applicable(&engine, &selector) {
                continue;
            }
            engine.operate(Operator::Replace, &selector).unwrap();
            engine.operate(Operator::Subtract, &selector).unwrap();
            prop_assert!(engine.working_set().is_empty());
        }
    }

    #[test]
    fn prop_variables_survive_later_operations((wiki, ops) in arb_session()) {
        let mut engine = build(&wiki);
        engine.load_page_links().unwrap();
        engine
            .operate(Operator::Replace, &Selector::in_namespace(Namespace::Main))
            .unwrap();
        let saved = engine.working_set().clone();
        engine.store_variable("saved");

        for (operator, selector) in ops {
            if applicable(&engine, &selector) {
                engine.operate(operator, &selector).unwrap();
            }
        }

        prop_assert_eq!(engine.load_variable("saved").unwrap(), saved.len());
        prop_assert_eq!(engine.working_set(), &saved);
    }
}
