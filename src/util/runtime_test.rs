// Tests for the runtime module

use super::*;

#[test]
fn test_run_async_executes_simple_future() {
    let result = run_async(async { 42 }).unwrap();
    assert_eq!(result, 42);
}

#[test]
fn test_run_async_propagates_values() {
    let data = vec![1, 2, 3];
    let sum = run_async(async move { data.iter().sum::<i32>() }).unwrap();
    assert_eq!(sum, 6);
}

#[test]
fn test_run_async_with_tokio_sleep() {
    let start = std::time::Instant::now();
    run_async(async {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    })
    .unwrap();
    assert!(start.elapsed() >= std::time::Duration::from_millis(10));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_async_inside_running_runtime() {
    let result = run_async(async { "nested" }).unwrap();
    assert_eq!(result, "nested");
}
