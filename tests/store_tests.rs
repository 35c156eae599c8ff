#![cfg(feature = "effect")]
//! Integration tests for the typed variable store and argument injection.

use effectum::error::LookupError;
use effectum::store::{Capability, Computation, Store};
use rstest::rstest;
use std::fmt::Display;
use std::rc::Rc;

trait Greeter {
    fn greet(&self, name: &str) -> String;
}

#[derive(Clone)]
struct English;

impl Greeter for English {
    fn greet(&self, name: &str) -> String {
        format!("hello {name}")
    }
}

#[derive(Clone)]
struct French;

impl Greeter for French {
    fn greet(&self, name: &str) -> String {
        format!("bonjour {name}")
    }
}

fn register_greeter<G: Greeter + Clone + 'static>(store: &mut Store, name: &str, greeter: G) {
    store.set_with(
        name,
        greeter,
        [Capability::new(|greeter: &G| Rc::new(greeter.clone()) as Rc<dyn Greeter>)],
    );
}

// =============================================================================
// Capability Lookup
// =============================================================================

mod capability_lookup {
    use super::*;

    #[rstest]
    fn test_interface_resolves_newest_implementation() {
        let mut store = Store::new();
        register_greeter(&mut store, "english", English);
        register_greeter(&mut store, "french", French);

        let greeter: Rc<dyn Greeter> = store.lookup().expect("greeter");
        assert_eq!(greeter.greet("ada"), "bonjour ada");
    }

    #[rstest]
    fn test_consuming_interface_removes_entry() {
        let mut store = Store::new();
        register_greeter(&mut store, "english", English);
        register_greeter(&mut store, "french", French);

        let _: Rc<dyn Greeter> = store.take().expect("french");
        let greeter: Rc<dyn Greeter> = store.take().expect("english");

        assert_eq!(greeter.greet("ada"), "hello ada");
        assert!(store.is_empty());
    }

    #[rstest]
    fn test_computation_accepts_interface_parameter() {
        let mut store = Store::new();
        register_greeter(&mut store, "english", English);
        store.insert("grace".to_string());

        let welcome = |name: String, greeter: Rc<dyn Greeter>| greeter.greet(&name);
        assert_eq!(welcome.invoke(&mut store), Ok("hello grace".to_string()));
    }

    #[rstest]
    fn test_exact_type_still_resolves() {
        let mut store = Store::new();
        store.set_with(
            "answer",
            42_i32,
            [Capability::new(|value: &i32| Rc::new(*value) as Rc<dyn Display>)],
        );

        assert_eq!(store.lookup::<i32>(), Ok(42));
        let shown: Rc<dyn Display> = store.lookup().expect("display");
        assert_eq!(shown.to_string(), "42");
    }
}

// =============================================================================
// Named Access
// =============================================================================

mod named_access {
    use super::*;

    #[rstest]
    fn test_get_reports_mismatch() {
        let mut store = Store::new();
        store.set("port", 8080_u16);

        assert_eq!(
            store.get::<String>("port"),
            Err(LookupError::TypeMismatch {
                name: "port".to_string(),
                expected: std::any::type_name::<String>(),
                found: "u16",
            })
        );
    }

    #[rstest]
    fn test_consume_mismatch_keeps_entry() {
        let mut store = Store::new();
        store.set("port", 8080_u16);

        assert!(store.consume::<u32>("port").is_err());
        assert_eq!(store.consume::<u16>("port"), Ok(8080));
        assert!(!store.contains("port"));
    }

    #[rstest]
    fn test_names_follow_insertion_order() {
        let mut store = Store::new();
        store.set("a", 1);
        store.set("b", 2);
        store.set("a", 3);

        assert_eq!(store.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(store.lookup::<i32>(), Ok(3));
    }

    #[rstest]
    fn test_synthesized_names_do_not_collide() {
        let mut store = Store::new();
        store.set("$1", 'x');
        let name = store.insert('y');

        assert_ne!(name, "$1");
        assert_eq!(store.get::<char>("$1"), Ok(&'x'));
        assert_eq!(store.get::<char>(&name), Ok(&'y'));
    }
}

// =============================================================================
// Injection
// =============================================================================

mod injection {
    use super::*;

    #[rstest]
    fn test_failed_resolution_against_copy_leaves_original() {
        let mut store = Store::new();
        store.insert(1_i32);

        let mut scratch = store.copy();
        let needs_more = |_: i32, _: String| ();
        assert!(needs_more.invoke(&mut scratch).is_err());

        assert_eq!(store.len(), 1);
    }

    #[rstest]
    fn test_store_parameter_receives_snapshot() {
        let mut store = Store::new();
        store.insert(3_u8);

        let count = |snapshot: Store, value: u8| (snapshot.len(), value);
        assert_eq!(count.invoke(&mut store), Ok((1, 3)));
        assert!(store.is_empty());
    }
}
