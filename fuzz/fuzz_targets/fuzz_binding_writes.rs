#![no_main]

//! Random reads and writes against a watched binding, including writes from
//! inside the render callback under both reentrancy policies.
//!
//! Errors are fine; panics, borrow conflicts, and miscounted renders are not.

use std::cell::Cell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rebind_dom::{MemoryDocument, SharedDocument, el, shared};
use rebind_runtime::{BindingConfig, ReactiveBinding, ReentrancyPolicy, State, StateHandle};

#[derive(Arbitrary, Debug)]
enum Op {
    Set { field: u8, value: i64 },
    Get(u8),
    Bump(u8),
    Render,
    ArmEcho(u8),
}

#[derive(Arbitrary, Debug)]
struct Input {
    reject: bool,
    max_depth: Option<u8>,
    ops: Vec<Op>,
}

const FIELDS: [&str; 4] = ["a", "b", "c", "late"];

fuzz_target!(|input: Input| {
    let mut config = BindingConfig::new().with_reentrancy(if input.reject {
        ReentrancyPolicy::Reject
    } else {
        ReentrancyPolicy::Recurse
    });
    // Unbounded recursion overflows the stack; keep nesting bounded.
    config = config.with_max_render_depth(usize::from(input.max_depth.unwrap_or(8)).min(16));

    let doc = shared(MemoryDocument::new());
    let host: SharedDocument = doc.clone();
    let binding = ReactiveBinding::builder(
        host,
        State::new().with("a", 0).with("b", 0).with("c", 0),
    )
    .config(config)
    .build();

    // Remaining nested writes the callback may still perform.
    let echo = Rc::new(Cell::new(0u8));
    let e = Rc::clone(&echo);
    let Ok(mount) = binding.watch(move |state: &StateHandle| {
        if e.get() > 0 {
            e.set(e.get() - 1);
            let _ = state.update("a", |v| v.as_int().unwrap_or(0).wrapping_add(1));
        }
        let a = state.get("a").and_then(|v| v.as_int()).unwrap_or(0);
        el("p").child(a.to_string())
    }) else {
        return;
    };

    let state = binding.state();
    for op in input.ops.into_iter().take(128) {
        let field = |i: u8| FIELDS[usize::from(i) % FIELDS.len()];
        match op {
            Op::Set { field: f, value } => {
                let _ = state.set(field(f), value);
            }
            Op::Get(f) => {
                let _ = state.get(field(f));
            }
            Op::Bump(f) => {
                let _ = state.update(field(f), |v| v.as_int().unwrap_or(0).wrapping_add(1));
            }
            Op::Render => {
                let _ = binding.render();
            }
            Op::ArmEcho(n) => echo.set(n % 4),
        }
        assert!(!binding.is_rendering());
        assert!(!state.is_tracked("late"));
    }

    assert!(doc.borrow().contains(mount));
});
