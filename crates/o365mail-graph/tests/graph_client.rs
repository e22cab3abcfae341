use std::time::Duration;

use httpmock::prelude::*;
use o365mail_graph::{GraphError, GraphMailClient, MailApi, StatusPolicy};
use serde_json::json;

const TOKEN: &str = "test-token";

fn client_for(server: &MockServer) -> GraphMailClient {
    GraphMailClient::builder(TOKEN)
        .base_url(server.base_url())
        .build()
        .unwrap()
}

fn message(id: &str) -> serde_json::Value {
    json!({
        "@odata.etag": "W/\"etag\"",
        "id": id,
        "createdDateTime": "2024-05-01T08:00:00Z",
        "lastModifiedDateTime": "2024-05-01T08:00:01Z",
        "receivedDateTime": "2024-05-01T08:00:00Z",
        "sentDateTime": "2024-05-01T07:59:58Z",
        "subject": format!("subject {id}"),
        "hasAttachments": false,
        "isRead": false,
        "isDraft": false,
        "importance": "normal",
        "inferenceClassification": "focused",
        "body": {"contentType": "text", "content": "hi"},
        "from": {"emailAddress": {"name": "Alice", "address": "alice@example.com"}},
        "sender": {"emailAddress": {"name": "Alice", "address": "alice@example.com"}},
        "toRecipients": [],
        "ccRecipients": [],
        "bccRecipients": [],
        "replyTo": [],
        "categories": [],
        "flag": {"flagStatus": "notFlagged"}
    })
}

#[tokio::test]
async fn test_list_inbox_messages_keeps_order_and_sends_headers() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/me/messages")
                .header("authorization", "Bearer test-token")
                .header("content-type", "application/json")
                .header("cache-control", "no-cache");
            then.status(200).json_body(json!({
                "@odata.context": "https://graph.microsoft.com/v1.0/$metadata#users('me')/messages",
                "@odata.nextLink": "https://graph.microsoft.com/v1.0/me/messages?$skip=10",
                "value": [message("A1"), message("A2")]
            }));
        })
        .await;

    let messages = client_for(&server).list_inbox_messages().await.unwrap();

    mock.assert_async().await;
    let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["A1", "A2"]);
    assert!(messages.has_more());
}

#[tokio::test]
async fn test_empty_value_gives_empty_collection() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/me/mailFolders/INBOX/messages");
            then.status(200).json_body(json!({ "value": [] }));
        })
        .await;

    let messages = client_for(&server)
        .list_folder_messages("INBOX")
        .await
        .unwrap();

    assert!(messages.is_empty());
    assert!(!messages.has_more());
}

#[tokio::test]
async fn test_list_inbox_messages_from_sends_encoded_filter() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/me/messages")
                .query_param("$filter", "(from/emailAddress/address) eq 'a+b@example.com'");
            then.status(200).json_body(json!({ "value": [message("F1")] }));
        })
        .await;

    let messages = client_for(&server)
        .list_inbox_messages_from("a+b@example.com")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages.value[0].id, "F1");
}

#[tokio::test]
async fn test_attachments_decode_and_use_configured_message_id() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/me/messages/MSG1/attachments");
            then.status(200).json_body(json!({
                "@odata.context": "https://graph.microsoft.com/v1.0/$metadata#users('me')/messages('MSG1')/attachments",
                "value": [{
                    "@odata.type": "#microsoft.graph.fileAttachment",
                    "id": "ATT1",
                    "lastModifiedDateTime": "2024-05-01T08:00:00Z",
                    "name": "report.csv",
                    "contentType": "text/csv",
                    "size": 7,
                    "isInline": false,
                    "contentId": null,
                    "contentLocation": null,
                    "contentBytes": "YSxiLGMKMQ=="
                }]
            }));
        })
        .await;

    let client = GraphMailClient::builder(TOKEN)
        .base_url(server.base_url())
        .message_id("MSG1")
        .build()
        .unwrap();
    let attachments = client.get_message_attachments().await.unwrap();

    mock.assert_async().await;
    assert_eq!(attachments.len(), 1);
    let attachment = &attachments.value[0];
    assert_eq!(attachment.name.as_deref(), Some("report.csv"));
    assert!(attachment.is_file_attachment());
    assert_eq!(attachment.decode_content().unwrap(), b"a,b,c\n1");
}

#[tokio::test]
async fn test_folder_endpoints() {
    let server = MockServer::start_async().await;
    let top = server
        .mock_async(|when, then| {
            when.method(GET).path("/me/mailFolders/");
            then.status(200).json_body(json!({
                "value": [
                    {"id": "INBOX", "displayName": "Inbox", "parentFolderId": "ROOT",
                     "childFolderCount": 1, "unreadItemCount": 3, "totalItemCount": 10},
                    {"id": "SENT", "displayName": "Sent Items", "parentFolderId": "ROOT",
                     "childFolderCount": 0, "unreadItemCount": 0, "totalItemCount": 4}
                ]
            }));
        })
        .await;
    let children = server
        .mock_async(|when, then| {
            when.method(GET).path("/me/mailFolders/INBOX/childFolders");
            then.status(200).json_body(json!({
                "value": [
                    {"id": "PROJ", "displayName": "Projects", "parentFolderId": "INBOX",
                     "childFolderCount": 0, "unreadItemCount": 1, "totalItemCount": 2}
                ]
            }));
        })
        .await;

    let client = client_for(&server);
    let folders = client.list_top_level_folders().await.unwrap();
    let names: Vec<&str> = folders.iter().map(|f| f.display_name.as_str()).collect();
    assert_eq!(names, vec!["Inbox", "Sent Items"]);

    let parent = folders.iter().find(|f| f.has_children()).unwrap();
    let subfolders = client.list_child_folders(&parent.id).await.unwrap();
    assert_eq!(subfolders.value[0].parent_folder_id.as_deref(), Some("INBOX"));

    top.assert_async().await;
    children.assert_async().await;
}

#[tokio::test]
async fn test_malformed_json_is_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/me/messages");
            then.status(200).body(r#"{"value": [{"id": "A1"}"#);
        })
        .await;

    let err = client_for(&server).list_inbox_messages().await.unwrap_err();
    assert!(err.is_decode(), "unexpected error: {err:?}");
    assert_eq!(err.status(), Some(200));
}

#[tokio::test]
async fn test_wrong_shape_is_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/me/mailFolders/");
            then.status(200).json_body(json!({ "value": [{ "displayName": "no id" }] }));
        })
        .await;

    let err = client_for(&server).list_top_level_folders().await.unwrap_err();
    assert!(err.is_decode());
}

#[tokio::test]
async fn test_error_status_passes_through_to_decode_by_default() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/me/messages");
            then.status(401).json_body(json!({
                "error": {"code": "InvalidAuthenticationToken", "message": "Access token has expired."}
            }));
        })
        .await;

    let err = client_for(&server).list_inbox_messages().await.unwrap_err();
    match err {
        GraphError::Decode { status, .. } => assert_eq!(status, 401),
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_error_status_short_circuits_in_strict_mode() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/me/messages/MISSING/attachments");
            then.status(404).json_body(json!({
                "error": {"code": "ErrorItemNotFound", "message": "The specified object was not found in the store."}
            }));
        })
        .await;

    let client = GraphMailClient::builder(TOKEN)
        .base_url(server.base_url())
        .status_policy(StatusPolicy::Strict)
        .build()
        .unwrap();
    let err = client.list_message_attachments("MISSING").await.unwrap_err();

    match err {
        GraphError::Api { status, code, message, .. } => {
            assert_eq!(status, 404);
            assert_eq!(code.as_deref(), Some("ErrorItemNotFound"));
            assert_eq!(
                message.as_deref(),
                Some("The specified object was not found in the store.")
            );
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let client = GraphMailClient::builder(TOKEN)
        .base_url("http://127.0.0.1:1")
        .build()
        .unwrap();

    let err = client.list_top_level_folders().await.unwrap_err();
    assert!(err.is_transport(), "unexpected error: {err:?}");
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/me/messages");
            then.status(200)
                .json_body(json!({ "value": [] }))
                .delay(Duration::from_millis(500));
        })
        .await;

    let client = GraphMailClient::builder(TOKEN)
        .base_url(server.base_url())
        .timeout(Some(Duration::from_millis(50)))
        .build()
        .unwrap();

    match client.list_inbox_messages().await.unwrap_err() {
        GraphError::Transport(e) => assert!(e.is_timeout()),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_ids_are_rejected_before_any_request() {
    let server = MockServer::start_async().await;
    let any = server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(200).json_body(json!({ "value": [] }));
        })
        .await;
    let client = client_for(&server);

    assert!(matches!(
        client.list_message_attachments("").await,
        Err(GraphError::InvalidArgument(_))
    ));
    assert!(matches!(
        client.list_child_folders("").await,
        Err(GraphError::InvalidArgument(_))
    ));
    assert!(matches!(
        client.list_folder_messages("").await,
        Err(GraphError::InvalidArgument(_))
    ));
    assert!(matches!(
        client.get_message_attachments().await,
        Err(GraphError::InvalidArgument(_))
    ));

    any.assert_hits_async(0).await;
}

async fn unread_count(api: &dyn MailApi, folder_id: &str) -> usize {
    api.list_folder_messages(folder_id)
        .await
        .unwrap()
        .iter()
        .filter(|m| !m.is_read)
        .count()
}

#[tokio::test]
async fn test_client_behind_trait_object() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/me/mailFolders/ARCHIVE/messages");
            then.status(200)
                .json_body(json!({ "value": [message("M1"), message("M2")] }));
        })
        .await;

    let client = client_for(&server);
    assert_eq!(unread_count(&client, "ARCHIVE").await, 2);
}

async fn attachment_names(api: &dyn MailApi) -> Vec<String> {
    api.get_message_attachments()
        .await
        .unwrap()
        .into_iter()
        .filter_map(|a| a.name)
        .collect()
}

#[tokio::test]
async fn test_configured_message_id_through_trait_object() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/me/messages/MSG9/attachments");
            then.status(200).json_body(json!({
                "value": [
                    {"id": "T1", "name": "a.pdf", "size": 10},
                    {"id": "T2", "name": "b.png", "size": 20}
                ]
            }));
        })
        .await;

    let client = GraphMailClient::builder(TOKEN)
        .base_url(server.base_url())
        .message_id("MSG9")
        .build()
        .unwrap();

    assert_eq!(attachment_names(&client).await, vec!["a.pdf", "b.png"]);
    mock.assert_async().await;
}
