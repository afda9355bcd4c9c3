#[cfg(test)]
mod environment_tests {
    use std::rc::Rc;

    use pron::environment::{root_of, Environment};
    use pron::value::Object;

    fn int_of(value: Option<pron::value::Value>) -> Option<i64> {
        value.and_then(|v| v.as_integer())
    }

    #[test]
    fn test_get_walks_outward() {
        let global = Environment::new_env();
        global.borrow_mut().set("a", Object::integer(1));

        let inner = Environment::enclosed(&global);
        inner.borrow_mut().set("b", Object::integer(2));

        assert_eq!(int_of(inner.borrow().get("a")), Some(1));
        assert_eq!(int_of(inner.borrow().get("b")), Some(2));
        assert!(global.borrow().get("b").is_none());
    }

    #[test]
    fn test_set_shadows_locally() {
        let global = Environment::new_env();
        global.borrow_mut().set("x", Object::integer(1));

        let inner = Environment::enclosed(&global);
        inner.borrow_mut().set("x", Object::integer(2));

        assert_eq!(int_of(inner.borrow().get("x")), Some(2));
        assert_eq!(int_of(global.borrow().get("x")), Some(1));
    }

    #[test]
    fn test_update_targets_nearest_defining_frame() {
        let global = Environment::new_env();
        global.borrow_mut().set("x", Object::integer(1));

        let middle = Environment::enclosed(&global);
        let inner = Environment::enclosed(&middle);

        assert!(inner.borrow_mut().update("x", Object::integer(5)));
        assert_eq!(int_of(global.borrow().get("x")), Some(5));
        assert!(middle.borrow().get("x").is_some());
        assert!(!inner.borrow_mut().update("missing", Object::integer(0)));
        assert!(inner.borrow().get("missing").is_none());
    }

    #[test]
    fn test_outermost_skips_intermediate_frames() {
        let root = Environment::new_env();
        root.borrow_mut().set("x", Object::integer(1));

        let inner = Environment::enclosed(&root);
        inner.borrow_mut().set("x", Object::integer(99));

        assert_eq!(int_of(inner.borrow().get_outermost("x")), Some(1));

        assert!(inner.borrow_mut().update_outermost("x", Object::integer(7)));
        assert_eq!(int_of(root.borrow().get("x")), Some(7));
        assert_eq!(int_of(inner.borrow().get("x")), Some(99));

        assert!(!inner.borrow_mut().update_outermost("y", Object::integer(0)));
    }

    #[test]
    fn test_detached_copy_has_independent_storage() {
        let class_env = Environment::new_env();
        class_env.borrow_mut().set("count", Object::integer(0));

        let parent = Environment::new_env();
        let child = Environment::enclosed(&parent);
        child.borrow_mut().set("count", Object::integer(3));

        let copy = child.borrow().detached_copy();
        assert!(copy.is_root());
        assert_eq!(int_of(copy.get("count")), Some(3));

        let original = child.borrow().get("count");
        let copied = copy.get("count");
        match (original, copied) {
            (Some(original), Some(copied)) => assert!(!Rc::ptr_eq(&original, &copied)),
            other => panic!("count missing: {:?}", other),
        }
    }

    #[test]
    fn test_root_of_finds_top_frame() {
        let root = Environment::new_env();
        let inner = Environment::enclosed(&Environment::enclosed(&root));

        assert!(Rc::ptr_eq(&root_of(&inner), &root));
        assert!(Rc::ptr_eq(&root_of(&root), &root));
    }
}
