use axum::http::StatusCode;

mod common;
use common::{
    assert_books_found, assert_books_not_found, counted, escape, get, insert_author, insert_book,
    listed_ids, setup_test_app,
};

/// Three books: "Dune" (10.0, author A), "Emma" (25.5, no author),
/// "Dune Messiah" (10.0, author B).
async fn seed(app: &common::TestApp) -> (i64, i64, i64, i64, i64) {
    let a = insert_author(&app.db, "Frank Herbert").await;
    let b = insert_author(&app.db, "Someone Else").await;
    let dune = insert_book(&app.db, "Dune", 10.0, Some(a.id)).await;
    let emma = insert_book(&app.db, "Emma", 25.5, None).await;
    let messiah = insert_book(&app.db, "Dune Messiah", 10.0, Some(b.id)).await;
    (dune.id, emma.id, messiah.id, a.id, b.id)
}

#[tokio::test]
async fn test_empty_criteria_matches_everything() {
    let app = setup_test_app().await;
    let (dune, emma, messiah, _, _) = seed(&app).await;

    assert_books_found(&app.router, "", &[dune, emma, messiah]).await;
    assert_books_found(&app.router, "distinct=false", &[dune, emma, messiah]).await;
}

#[tokio::test]
async fn test_id_filters() {
    let app = setup_test_app().await;
    let (dune, emma, messiah, _, _) = seed(&app).await;

    assert_books_found(&app.router, &format!("id.equals={dune}"), &[dune]).await;
    assert_books_found(&app.router, &format!("id.notEquals={dune}"), &[emma, messiah]).await;
    assert_books_found(&app.router, &format!("id.in={dune},{messiah}"), &[dune, messiah]).await;
    assert_books_found(&app.router, &format!("id.in={dune}&id.in={emma}"), &[dune, emma]).await;
    assert_books_found(&app.router, &format!("id.notIn={dune},{emma}"), &[messiah]).await;
    assert_books_found(&app.router, "id.specified=true", &[dune, emma, messiah]).await;
    assert_books_not_found(&app.router, "id.specified=false").await;
    assert_books_found(&app.router, &format!("id.greaterThan={dune}"), &[emma, messiah]).await;
    assert_books_found(&app.router, &format!("id.lessThanOrEqual={emma}"), &[dune, emma]).await;
}

#[tokio::test]
async fn test_title_filters() {
    let app = setup_test_app().await;
    let (dune, emma, messiah, _, _) = seed(&app).await;

    assert_books_found(&app.router, "title.equals=Dune", &[dune]).await;
    assert_books_not_found(&app.router, "title.equals=Dun").await;
    assert_books_found(&app.router, &format!("title.in={}", escape("Emma,Dune Messiah")), &[emma, messiah]).await;
    assert_books_found(&app.router, "title.contains=Dune", &[dune, messiah]).await;
    assert_books_found(&app.router, "title.doesNotContain=Messiah", &[dune, emma]).await;
    assert_books_found(&app.router, "title.notEquals=Dune", &[emma, messiah]).await;
}

#[tokio::test]
async fn test_contains_treats_wildcards_literally() {
    let app = setup_test_app().await;
    let plain = insert_book(&app.db, "Fifty Shades", 5.0, None).await;
    let percent = insert_book(&app.db, "100% Rust", 5.0, None).await;
    let underscore = insert_book(&app.db, "snake_case", 5.0, None).await;

    assert_books_found(&app.router, &format!("title.contains={}", escape("%")), &[percent.id]).await;
    assert_books_found(&app.router, &format!("title.contains={}", escape("_")), &[underscore.id]).await;
    assert_books_found(
        &app.router,
        &format!("title.doesNotContain={}", escape("%")),
        &[plain.id, underscore.id],
    )
    .await;
}

#[tokio::test]
async fn test_price_range_boundaries() {
    let app = setup_test_app().await;
    let (dune, emma, messiah, _, _) = seed(&app).await;

    assert_books_found(&app.router, "price.equals=10.0", &[dune, messiah]).await;
    assert_books_found(&app.router, "price.greaterThan=10.0", &[emma]).await;
    assert_books_found(&app.router, "price.greaterThanOrEqual=10.0", &[dune, emma, messiah]).await;
    assert_books_not_found(&app.router, "price.lessThan=10.0").await;
    assert_books_found(&app.router, "price.lessThanOrEqual=10.0", &[dune, messiah]).await;
    assert_books_found(
        &app.router,
        "price.greaterThan=10.0&price.lessThan=30",
        &[emma],
    )
    .await;
}

#[tokio::test]
async fn test_author_relation_filter() {
    let app = setup_test_app().await;
    let (dune, _emma, messiah, a, b) = seed(&app).await;

    assert_books_found(&app.router, &format!("authorId.equals={a}"), &[dune]).await;
    assert_books_not_found(&app.router, &format!("authorId.equals={}", a + b + 100)).await;
    assert_books_found(&app.router, &format!("authorId.in={a},{b}"), &[dune, messiah]).await;
    assert_books_found(&app.router, &format!("authorId.greaterThan={a}"), &[messiah]).await;
}

#[tokio::test]
async fn test_specified_partitions_nullable_field() {
    let app = setup_test_app().await;
    let (dune, emma, messiah, _, _) = seed(&app).await;

    let with_author = listed_ids(&app.router, "authorId.specified=true").await;
    let without_author = listed_ids(&app.router, "authorId.specified=false").await;

    assert_eq!(with_author, vec![dune, messiah]);
    assert_eq!(without_author, vec![emma]);
    assert_eq!(
        counted(&app.router, "authorId.specified=true").await
            + counted(&app.router, "authorId.specified=false").await,
        counted(&app.router, "").await
    );
}

#[tokio::test]
async fn test_not_equals_excludes_nulls() {
    let app = setup_test_app().await;
    let (dune, _emma, messiah, a, _) = seed(&app).await;

    // "Emma" has no author and is excluded by both negations
    assert_books_found(&app.router, &format!("authorId.notEquals={a}"), &[messiah]).await;
    assert_books_found(&app.router, &format!("authorId.notIn={a}"), &[messiah]).await;
    assert_books_found(&app.router, &format!("authorId.notEquals={}", a + 1000), &[dune, messiah]).await;
}

#[tokio::test]
async fn test_filters_on_two_fields_are_conjunctive() {
    let app = setup_test_app().await;
    let (dune, _emma, messiah, a, _) = seed(&app).await;

    // Each side alone matches two books; together only one
    assert_books_found(&app.router, &format!("title.contains=Dune&authorId.equals={a}"), &[dune]).await;
    assert_books_found(&app.router, "title.contains=Dune&price.equals=10.0", &[dune, messiah]).await;
    assert_books_not_found(&app.router, "title.equals=Emma&price.lessThan=20").await;
}

#[tokio::test]
async fn test_distinct_with_join() {
    let app = setup_test_app().await;
    let (dune, _emma, messiah, a, b) = seed(&app).await;

    let query = format!("distinct=true&authorId.in={a},{b}&price.equals=10.0");
    assert_books_found(&app.router, &query, &[dune, messiah]).await;
}

#[tokio::test]
async fn test_blank_set_values_compare_against_empty_string() {
    let app = setup_test_app().await;
    let (dune, emma, messiah, _, _) = seed(&app).await;

    assert_books_not_found(&app.router, "title.in=").await;
    assert_books_found(&app.router, "title.notIn=", &[dune, emma, messiah]).await;
}

#[tokio::test]
async fn test_unknown_parameters_are_ignored() {
    let app = setup_test_app().await;
    let (dune, emma, messiah, _, _) = seed(&app).await;

    assert_books_found(&app.router, "isbn.equals=1&title.greaterThan=A&foo=bar", &[dune, emma, messiah]).await;
}

#[tokio::test]
async fn test_malformed_values_are_bad_requests() {
    let app = setup_test_app().await;
    seed(&app).await;

    for query in [
        "price.greaterThan=cheap",
        "id.in=1,two",
        "authorId.specified=maybe",
        "price.equals=NaN",
        "distinct=maybe",
    ] {
        let list = get(&app.router, &format!("/api/books?{query}")).await;
        assert_eq!(list.status, StatusCode::BAD_REQUEST, "{query}");
        assert!(list.body["error"].as_str().unwrap().contains("Invalid value"), "{query}");

        let count = get(&app.router, &format!("/api/books/count?{query}")).await;
        assert_eq!(count.status, StatusCode::BAD_REQUEST, "{query}");
    }
}
