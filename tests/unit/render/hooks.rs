use super::*;

#[test]
fn runs_in_registration_order() {
    let mut list = HookList::<Vec<u32>>::new("before_render");
    list.push(|v: &mut Vec<u32>| {
        v.push(1);
        Ok(())
    });
    list.push(|v: &mut Vec<u32>| {
        v.push(2);
        Ok(())
    });
    let mut seen = Vec::new();
    list.run(&mut seen).unwrap();
    assert_eq!(seen, vec![1, 2]);
    assert_eq!(list.len(), 2);
    assert_eq!(list.name(), "before_render");
}

#[test]
fn first_failure_stops_and_is_wrapped() {
    let mut list = HookList::<Vec<u32>>::new("after_render");
    list.push(|v: &mut Vec<u32>| {
        v.push(1);
        Ok(())
    });
    list.push(|_: &mut Vec<u32>| Err(CardError::validation("nope")));
    list.push(|v: &mut Vec<u32>| {
        v.push(3);
        Ok(())
    });

    let mut seen = Vec::new();
    let err = list.run(&mut seen).unwrap_err();
    assert_eq!(seen, vec![1]);
    assert_eq!(err.code(), "HOOK_FAILED");
    let CardError::Plugin { context, .. } = err else {
        panic!("expected plugin error");
    };
    assert_eq!(context["hook"], "after_render");
    assert_eq!(context["index"], 1);
    assert!(context["error"].as_str().unwrap().contains("nope"));
}

#[test]
fn clones_share_hooks_and_clear_empties() {
    let mut list = HookList::<u32>::new("pre_layout");
    list.push(|n: &mut u32| {
        *n += 1;
        Ok(())
    });
    let copy = list.clone();
    list.clear();
    assert!(list.is_empty());

    let mut n = 0;
    copy.run(&mut n).unwrap();
    assert_eq!(n, 1);
}
