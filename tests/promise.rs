//! Мост к future: `EventBus::promise` поверх динамической шины.

use std::{sync::Arc, time::Duration};

use tokio::time::timeout;
use zevent::{args, Args, BusError, EventBus, Payload, PromiseError, StackError, StatusCode};

/// Тест проверяет сценарий "y": future разрешается значением `emit`.
#[tokio::test]
async fn test_promise_resolves_with_first_argument() {
    let bus: EventBus = EventBus::new();
    let pending = bus.promise("y");

    bus.emit("y", args!["done"]);
    let value = pending.into_value().await.unwrap();
    assert_eq!(value, Payload::from("done"));
}

#[tokio::test]
async fn test_promise_resolves_with_all_arguments() {
    let bus: EventBus = EventBus::new();
    let pending = bus.promise("pair");

    bus.emit("pair", args![1, "two"]);
    let args = pending.await.unwrap();
    assert_eq!(args.len(), 2);
    assert_eq!(args.first(), Some(&Payload::Int(1)));
    assert_eq!(args.into_value(), Payload::Int(1));
}

#[tokio::test]
async fn test_promise_without_arguments_resolves_to_null() {
    let bus: EventBus = EventBus::new();
    let pending = bus.promise("ready");
    bus.emit("ready", Args::new());
    assert_eq!(pending.await.unwrap().into_value(), Payload::Null);
}

#[tokio::test]
async fn test_promise_rejects_with_reason() {
    let bus: EventBus = EventBus::new();
    let pending = bus.promise("job");

    bus.error(
        "job",
        BusError::ConfigLoad {
            reason: "no route".to_string(),
        }
        .into(),
    );
    // второй сигнал уже никого не достигает
    bus.emit("job", args![1]);

    match pending.await {
        Err(PromiseError::Rejected(reason)) => {
            assert_eq!(reason.status_code(), StatusCode::ConfigLoad);
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(bus.handler_count("job"), 0);
}

/// Тест проверяет преобразование ошибок promise в `StackError` через `?`.
#[tokio::test]
async fn test_promise_error_into_stack_error() {
    async fn wait(bus: &EventBus) -> Result<Payload, StackError> {
        let args = bus.promise("never").await?;
        Ok(args.into_value())
    }

    let bus: EventBus = EventBus::new();
    let waiting = wait(&bus);
    tokio::pin!(waiting);

    // подписка создаётся при первом poll
    assert!(timeout(Duration::from_millis(10), &mut waiting).await.is_err());
    bus.destroy();

    let err = waiting.await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::Abandoned);
}

#[tokio::test]
async fn test_independent_promises_on_one_channel() {
    let bus: EventBus = EventBus::new();
    let first = bus.promise("tick");
    let second = bus.promise("tick");
    assert_eq!(bus.handler_count("tick"), 2);

    bus.emit("tick", args![1]);
    assert_eq!(first.await.unwrap().into_value(), Payload::Int(1));
    assert_eq!(second.await.unwrap().into_value(), Payload::Int(1));
}

/// Тест проверяет ожидание события, которое публикует другая задача.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_promise_across_tasks() {
    let bus: Arc<EventBus> = Arc::new(EventBus::new());
    let pending = bus.promise("connected");

    let producer = bus.clone();
    let task = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        producer.emit("connected", args!["db-1"]);
    });

    let value = timeout(Duration::from_secs(2), pending)
        .await
        .expect("promise timed out")
        .expect("promise rejected");
    assert_eq!(value.into_value(), Payload::from("db-1"));
    task.await.unwrap();
}

#[tokio::test]
async fn test_cancelled_wait_releases_subscription() {
    let bus: EventBus = EventBus::new();
    let pending = bus.promise("late");
    assert!(timeout(Duration::from_millis(10), pending).await.is_err());
    assert_eq!(bus.handler_count("late"), 0);
}
