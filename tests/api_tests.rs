// tests/api_tests.rs

mod common;

use common::{TRYOUT_ID, spawn_app};
use tryout_client::{
    api::catalog::paginate,
    error::AppError,
};

#[tokio::test]
async fn unknown_attempt_is_remote_404() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let result = app.client.get_attempt(TRYOUT_ID, 99).await;

    // Assert
    match result {
        Err(AppError::Remote { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Attempt not found");
        }
        other => panic!("expected 404, got {:?}", other),
    }
}

#[tokio::test]
async fn missing_token_fails_before_request() {
    // Arrange
    let app = spawn_app().await;
    let anonymous = app.anonymous_client();

    // Act
    let result = anonymous.list_attempts(TRYOUT_ID).await;

    // Assert
    assert!(matches!(result, Err(AppError::MissingToken)));
}

#[tokio::test]
async fn blank_tryout_id_is_missing_parameter() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let result = app.client.fetch_questions("  ").await;

    // Assert
    assert!(matches!(result, Err(AppError::MissingParameter(_))));
}

#[tokio::test]
async fn questions_are_fetched_with_encoded_id() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let questions = app.client.fetch_questions(TRYOUT_ID).await.unwrap();

    // Assert
    assert_eq!(questions.len(), 4);
    assert_eq!(questions[0].options.len(), 4);
    assert!(questions.iter().all(|q| q.answer_key.is_some()));
}

#[tokio::test]
async fn pdf_is_downloaded_and_checked() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let pdf = app.client.fetch_pdf(TRYOUT_ID).await;
    let not_pdf = app.client.fetch_pdf("TO-2").await;

    // Assert
    assert!(pdf.unwrap().starts_with(b"%PDF-"));
    assert!(matches!(not_pdf, Err(AppError::Decode(_))));
}

#[tokio::test]
async fn catalog_is_public_and_available_excludes_owned() {
    // Arrange
    let app = spawn_app().await;
    let anonymous = app.anonymous_client();

    // Act
    let all = anonymous.list_packages().await.expect("public catalog");
    let available = app.client.list_available_packages().await.unwrap();

    // Assert
    assert_eq!(all.len(), 3);
    let ids: Vec<&str> = available.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["P2", "P3"]);
    assert_eq!(paginate(&available, 1).total_pages, 1);
}

#[tokio::test]
async fn owned_packages_accept_numeric_price() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let owned = app.client.list_owned_packages().await.unwrap();

    // Assert
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].price, 150000.0);
    assert!(!owned[0].is_expired(chrono::Utc::now()));
}

#[tokio::test]
async fn package_tryouts_are_filtered() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let tryouts = app.client.list_package_tryouts("P2").await.unwrap();
    let single = app.client.get_tryout(TRYOUT_ID).await.unwrap();

    // Assert
    assert_eq!(tryouts.len(), 1);
    assert_eq!(tryouts[0].id, "TO-2");
    assert_eq!(single.paket_id, "P1");
    assert!(matches!(
        app.client.list_package_tryouts(" ").await,
        Err(AppError::MissingParameter(_))
    ));
}
