use reqwest::StatusCode;
use serde_json::Value;

mod common;
use common::start_server;

#[tokio::test]
async fn all_pokemon_json_uses_display_strings() {
    let (base, handle) = start_server().await;

    let res = reqwest::get(format!("{base}/pokemon/json")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();

    let list = body["Pokemon"].as_array().unwrap();
    assert!(list.len() >= 3);

    let bulbasaur = list
        .iter()
        .find(|p| p["name"] == "Bulbasaur")
        .expect("seeded entry present");
    assert_eq!(bulbasaur["pokedex_id"], 1);
    assert_eq!(bulbasaur["height"], "2'4\"");
    assert_eq!(bulbasaur["types"], "Grass, Poison");
    assert_eq!(bulbasaur["weaknesses"], "Fire, Flying, Ice, Psychic");
    assert_eq!(bulbasaur["category"], "Seed");
    assert_eq!(bulbasaur["is_legendary"], false);
    // list columns are reduced to strings, never raw id arrays
    assert!(bulbasaur["types"].is_string());
    assert!(bulbasaur.get("user_id").is_none());

    handle.abort();
}

#[tokio::test]
async fn single_pokemon_json_wraps_a_list() {
    let (base, handle) = start_server().await;

    let body: Value = reqwest::get(format!("{base}/pokemon/json"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = body["Pokemon"][0]["id"].as_i64().unwrap();

    let body: Value = reqwest::get(format!("{base}/pokemon/{id}/json"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["Pokemon"].as_array().unwrap().len(), 1);
    assert_eq!(body["Pokemon"][0]["id"].as_i64().unwrap(), id);

    // unknown ids come back as an empty collection, not 404
    let res = reqwest::get(format!("{base}/pokemon/999999/json")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["Pokemon"].as_array().unwrap().len(), 0);

    handle.abort();
}

#[tokio::test]
async fn type_filtered_json() {
    let (base, handle) = start_server().await;

    let body: Value = reqwest::get(format!("{base}/pokemon/type/water/json"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let list = body["Pokemon"].as_array().unwrap();
    assert!(list.iter().any(|p| p["name"] == "Squirtle"));
    assert!(list.iter().all(|p| p["name"] != "Charmander"));

    // "all" mirrors the full collection
    let body: Value = reqwest::get(format!("{base}/pokemon/type/all/json"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["Pokemon"].as_array().unwrap().len() >= 3);

    // unknown types yield an empty collection
    let body: Value = reqwest::get(format!("{base}/pokemon/type/shadow/json"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["Pokemon"].as_array().unwrap().len(), 0);

    handle.abort();
}

#[tokio::test]
async fn reference_table_json() {
    let (base, handle) = start_server().await;

    let body: Value = reqwest::get(format!("{base}/pokemon/type/json"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let types = body["Types"].as_array().unwrap();
    assert_eq!(types.len(), 18);
    assert!(types.iter().any(|t| t["name"] == "Electric"));
    assert!(types[0]["id"].is_number());

    let body: Value = reqwest::get(format!("{base}/pokemon/category/json"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["Categories"].as_array().unwrap().iter().any(|c| c["name"] == "Seed"));

    let body: Value = reqwest::get(format!("{base}/pokemon/move/json"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["Moves"].as_array().unwrap().iter().any(|m| m["name"] == "Razor Leaf"));

    handle.abort();
}
