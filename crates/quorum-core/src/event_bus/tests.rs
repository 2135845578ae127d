use super::*;
use crate::domain::ResponderId;
use uuid::Uuid;

#[tokio::test]
async fn test_publish_subscribe() {
    let bus = EventBus::new(16);
    let mut rx = bus.subscribe();

    let request_id = Uuid::new_v4();
    bus.publish(WorkflowEvent::ResponderAnswered {
        request_id,
        responder: ResponderId::Weather,
    });

    let event = rx.recv().await.unwrap();
    assert_eq!(event.request_id(), request_id);
    match event {
        WorkflowEvent::ResponderAnswered { responder, .. } => {
            assert_eq!(responder, ResponderId::Weather);
        }
        _ => panic!("unexpected event type"),
    }
}

#[tokio::test]
async fn test_multiple_subscribers() {
    let bus = EventBus::new(16);
    let mut rx1 = bus.subscribe();
    let mut rx2 = bus.subscribe();
    assert_eq!(bus.subscriber_count(), 2);

    let request_id = Uuid::new_v4();
    assert_eq!(bus.publish(WorkflowEvent::RunCancelled { request_id }), 2);

    assert_eq!(rx1.recv().await.unwrap().request_id(), request_id);
    assert_eq!(rx2.recv().await.unwrap().request_id(), request_id);
}

#[test]
fn test_publish_without_subscribers() {
    let bus = EventBus::default();
    assert_eq!(
        bus.publish(WorkflowEvent::RunStarted {
            request_id: Uuid::nil()
        }),
        0
    );
}

#[test]
fn test_event_serialization() {
    let event = WorkflowEvent::CapReached {
        request_id: Uuid::nil(),
        visits: 16,
    };
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"type\":\"cap_reached\""));
    assert!(json.contains("\"visits\":16"));
}
