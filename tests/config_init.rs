mod common;

use dbextract::config::Config;
use dbextract::store::TableStore;

#[tokio::test]
async fn init_creates_tables_where_the_existing_config_points() {
    let tmp = tempfile::tempdir().unwrap();
    let db_dir = tmp.path().join("custom-db");
    let config_path = tmp.path().join("dbextract.toml");

    let mut config = Config::default();
    config.storage.db_dir = db_dir.to_string_lossy().into_owned();
    config.storage.locale = "deDE".to_string();
    config.storage.suffix = "custom".to_string();
    std::fs::write(&config_path, toml::to_string_pretty(&config).unwrap()).unwrap();

    let loaded = Config::load_or_default(config_path.to_str().unwrap())
        .await
        .unwrap();
    let store = TableStore::from_config(&loaded.storage);
    let created = store.ensure_all().await.unwrap();

    assert_eq!(created.len(), 10);
    assert!(created.iter().all(|p| p.starts_with(&db_dir)));
    assert!(db_dir.join("deDE/units-custom.lua").exists());
    assert!(db_dir.join("quests-itemreq-custom.lua").exists());
    assert_eq!(
        common::read(&db_dir.join("deDE/items-custom.lua")),
        "pfDB[\"items\"][\"deDE-custom\"] = {\n}\n"
    );

    assert!(store.ensure_all().await.unwrap().is_empty());
}
