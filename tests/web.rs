// Browser-only checks for the localStorage port. Run with `wasm-pack test --headless`.
#![cfg(target_arch = "wasm32")]

use veil_quest::store::Repo;
use veil_quest::{LocalStorageStore, ProgressRecord, ProgressStore};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn local_storage_roundtrip() {
    let mut store = LocalStorageStore;
    store.save("vq-test", "hello").unwrap();
    assert_eq!(store.load("vq-test").unwrap().as_deref(), Some("hello"));
    store.remove("vq-test").unwrap();
    assert_eq!(store.load("vq-test").unwrap(), None);
}

#[wasm_bindgen_test]
fn repo_over_local_storage_defaults_then_persists() {
    let mut repo = Repo::new(LocalStorageStore, "vq-test-progress");
    repo.clear();
    assert_eq!(repo.load_progress(), ProgressRecord::default());
    let mut p = ProgressRecord::default();
    p.completed.insert("c1-l1".into());
    repo.save_progress(&p);
    assert_eq!(repo.load_progress(), p);
    repo.clear();
}
