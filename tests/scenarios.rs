use approx::assert_abs_diff_eq;
use item_recommender::{Endpoint, Service};
use serde_json::{json, Value};

fn scenario_records() -> Value {
    json!([
        {"user_id": "A", "item_id": "X", "category": "ml", "rating": 5},
        {"user_id": "A", "item_id": "Y", "category": "ml", "rating": 0},
        {"user_id": "A", "item_id": "Z", "category": "ml", "rating": 3},
        {"user_id": "B", "item_id": "X", "category": "ml", "rating": 1},
        {"user_id": "B", "item_id": "Y", "category": "ml", "rating": 4},
        {"user_id": "B", "item_id": "Z", "category": "ml", "rating": 0},
    ])
}

/// records -> matrix -> similarity, through the JSON layer
fn matrices(service: &Service) -> (Value, Value) {
    let matrix = service
        .dispatch(Endpoint::UserItemMatrix, json!({"data": scenario_records(), "category": "ml"}))
        .unwrap()["user_item_matrix"]
        .clone();
    let sim = service
        .dispatch(Endpoint::ItemSimilarity, json!({"user_item_matrix": matrix}))
        .unwrap()["item_similarity_df"]
        .clone();
    (matrix, sim)
}

fn recommend(service: &Service, user: &str, matrix: &Value, sim: &Value, top_n: usize) -> Value {
    service
        .dispatch(
            Endpoint::Recommend,
            json!({"user_id": user, "user_item_matrix": matrix, "item_similarity_df": sim, "top_n": top_n}),
        )
        .unwrap()["recommended_items"]
        .clone()
}

#[test]
fn similarity_values_match_hand_computation() {
    let (_, sim) = matrices(&Service::default());
    let get = |a: &str, b: &str| sim[a][b].as_f64().unwrap();
    assert_abs_diff_eq!(get("X", "Y"), 1.0 / 26f64.sqrt(), epsilon = 1e-9);
    assert_abs_diff_eq!(get("X", "Z"), 5.0 / 26f64.sqrt(), epsilon = 1e-9);
    assert_abs_diff_eq!(get("Y", "Z"), 0.0);
    assert_abs_diff_eq!(get("X", "X"), 1.0, epsilon = 1e-12);
}

#[test]
fn known_user_only_gets_unrated_items() {
    let service = Service::default();
    let (matrix, sim) = matrices(&service);
    assert_eq!(recommend(&service, "A", &matrix, &sim, 3), json!(["Y"]));
    assert_eq!(recommend(&service, "A", &matrix, &sim, 1), json!(["Y"]));
}

#[test]
fn unknown_user_gets_items_by_mean_rating() {
    let service = Service::default();
    let (matrix, sim) = matrices(&service);
    assert_eq!(recommend(&service, "C", &matrix, &sim, 3), json!(["X", "Y", "Z"]));
    assert_eq!(recommend(&service, "C", &matrix, &sim, 2), json!(["X", "Y"]));
    assert_eq!(recommend(&service, "D", &matrix, &sim, 2), json!(["X", "Y"]));
}

#[test]
fn empty_category_recommends_nothing() {
    let service = Service::default();
    let matrix = service
        .dispatch(Endpoint::UserItemMatrix, json!({"data": scenario_records(), "category": "art"}))
        .unwrap()["user_item_matrix"]
        .clone();
    assert_eq!(matrix, json!({}));
    let sim = service
        .dispatch(Endpoint::ItemSimilarity, json!({"user_item_matrix": matrix}))
        .unwrap()["item_similarity_df"]
        .clone();
    assert_eq!(sim, json!({}));
    assert_eq!(recommend(&service, "A", &matrix, &sim, 3), json!([]));
    assert_eq!(recommend(&service, "nobody", &matrix, &sim, 3), json!([]));
}

#[test]
fn catalog_recommends_per_category() {
    let mut records = scenario_records();
    records
        .as_array_mut()
        .unwrap()
        .push(json!({"user_id": "B", "item_id": "P", "category": "db", "rating": 2}));
    let out = Service::default()
        .dispatch(Endpoint::RecommendAll, json!({"data": records, "user_id": "A", "top_n": 3}))
        .unwrap();
    assert_eq!(
        out,
        json!({"recommendations": [
            {"item_id": "Y", "category": "ml"},
            {"item_id": "P", "category": "db"},
        ]})
    );
}
