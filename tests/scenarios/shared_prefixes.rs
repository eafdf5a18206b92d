//! Test: keys that share prefixes or are prefixes of each other

use crate::helpers::*;
use prefix_trees::execution::SchedulingStrategy;
use prefix_trees::tree::TreeKind;

/// Keys nest inside each other, then get removed from the middle outwards
#[tokio::test]
async fn test_nested_prefix_keys() {
    let yaml = r#"
name: "Test: nested prefixes"
operations:
  - op: insert
    key: "a"
    value: 1
  - op: insert
    key: "ab"
    value: 2
  - op: insert
    key: "abc"
    value: 3
  - op: insert
    key: "abcd"
    value: 4
  - op: delete
    key: "ab"
  - op: find
    key: "a"
    expect: 1
  - op: find
    key: "ab"
    missing: true
  - op: find
    key: "abc"
    expect: 3
  - op: delete
    key: "abcd"
  - op: find
    key: "abc"
    expect: 3
  - op: find
    key: "abcd"
    missing: true
"#;

    let result = run_yaml(yaml, SchedulingStrategy::Sequential).await;

    assert_run_completed(&result);
    assert_backends_agree(&result);
    let art = result.run.result(TreeKind::Art).unwrap();
    assert_eq!(art.final_len, 2);
    assert_eq!(art.hits, 3);
    assert_eq!(art.misses, 2);
}

/// Splitting edges on insert and merging them back on delete
#[tokio::test]
async fn test_split_and_merge() {
    let yaml = r#"
name: "Test: split and merge"
structures: [radix, trie, btree]
operations:
  - op: insert
    key: "romane"
    value: 1
  - op: insert
    key: "romanus"
    value: 2
  - op: insert
    key: "romulus"
    value: 3
  - op: delete
    key: "romulus"
  - op: delete
    key: "romane"
  - op: find
    key: "romanus"
    expect: 2
  - op: insert
    key: "roman"
    value: 4
  - op: find
    key: "roman"
    expect: 4
  - op: find
    key: "rom"
    missing: true
"#;

    let result = run_yaml(yaml, SchedulingStrategy::Parallel).await;

    assert_run_completed(&result);
    assert_backends_agree(&result);
    assert_eq!(result.run.results.len(), 3);
    assert!(result.run.results.iter().all(|stats| stats.final_len == 2));
}

/// The empty key is a key like any other
#[tokio::test]
async fn test_empty_key() {
    let yaml = r#"
name: "Test: empty key"
operations:
  - op: find
    key: ""
    missing: true
  - op: insert
    key: ""
    value: 10
  - op: insert
    key: "x"
    value: 11
  - op: find
    key: ""
    expect: 10
  - op: delete
    key: ""
  - op: find
    key: ""
    missing: true
  - op: find
    key: "x"
    expect: 11
"#;

    let result = run_yaml(yaml, SchedulingStrategy::Sequential).await;

    assert_run_completed(&result);
    assert_backends_agree(&result);
    assert!(result.run.results.iter().all(|stats| stats.final_len == 1));
}

/// Multi-byte characters never get split mid-character
#[tokio::test]
async fn test_unicode_keys() {
    let yaml = r#"
name: "Test: unicode"
operations:
  - op: insert
    key: "héllo"
    value: 1
  - op: insert
    key: "hèllo"
    value: 2
  - op: insert
    key: "h€"
    value: 3
  - op: find
    key: "hèllo"
    expect: 2
  - op: delete
    key: "héllo"
  - op: find
    key: "h€"
    expect: 3
  - op: find
    key: "héllo"
    missing: true
"#;

    let result = run_yaml(yaml, SchedulingStrategy::LimitedParallel(2)).await;

    assert_run_completed(&result);
    assert_backends_agree(&result);
}
