//! Detail-pass behavior: wholesale replacement, fault isolation, and
//! target selection, against the in-memory store and scripted extractor.

use pricewatch::application::{EnrichEngine, EnrichOptions};
use pricewatch::domain::detail::DetailBundle;
use pricewatch::domain::errors::ExtractionError;
use pricewatch::domain::listing::ProductCandidate;
use pricewatch::domain::platform::Platform;
use pricewatch::domain::store::ProductStore;
use pricewatch::test_utils::{MemoryStore, ScriptedDetailExtractor};

fn candidate(id: &str, link: Option<&str>) -> ProductCandidate {
    ProductCandidate {
        platform: Platform::Trendyol,
        platform_product_id: id.to_string(),
        link: link.map(str::to_string),
        title: Some(format!("Product {id}")),
        brand: None,
    }
}

fn bundle_with_attributes(attributes: &[(&str, &str)]) -> DetailBundle {
    DetailBundle {
        description: Some("Detailed description".to_string()),
        store_name: Some("MegaStore".to_string()),
        store_rating: Some(9.4),
        rating: Some(4.5),
        free_shipping: true,
        attributes: attributes
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect(),
        ..DetailBundle::default()
    }
}

#[tokio::test]
async fn attribute_replacement_is_wholesale() {
    let store = MemoryStore::new();
    let product = store
        .upsert_product(&candidate("A", Some("https://example.test/p/A")))
        .await
        .unwrap();

    store
        .replace_detail(
            product.id,
            &bundle_with_attributes(&[("Renk", "Kirmizi"), ("Beden", "M")]),
        )
        .await
        .unwrap();
    store
        .replace_detail(product.id, &bundle_with_attributes(&[("Renk", "Mavi")]))
        .await
        .unwrap();

    assert_eq!(
        store.attributes(product.id),
        vec![("Renk".to_string(), "Mavi".to_string())]
    );
}

#[tokio::test]
async fn successful_pass_overwrites_fields_with_this_pass_values() {
    let store = MemoryStore::new();
    let product = store
        .upsert_product(&candidate("B", Some("https://example.test/p/B")))
        .await
        .unwrap();

    store
        .replace_detail(product.id, &bundle_with_attributes(&[]))
        .await
        .unwrap();
    assert!(store.detail(product.id).unwrap().description.is_some());

    // Latest page is truth: a field the next pass did not find is erased.
    let mut sparse = bundle_with_attributes(&[]);
    sparse.description = None;
    store.replace_detail(product.id, &sparse).await.unwrap();
    assert!(store.detail(product.id).unwrap().description.is_none());
}

#[tokio::test]
async fn enriches_every_product_missing_detail() {
    let store = MemoryStore::new();
    store
        .upsert_product(&candidate("A", Some("https://example.test/p/A")))
        .await
        .unwrap();
    store
        .upsert_product(&candidate("B", Some("https://example.test/p/B")))
        .await
        .unwrap();

    let extractor = ScriptedDetailExtractor::new()
        .with_bundle(
            "https://example.test/p/A",
            bundle_with_attributes(&[("Renk", "Mavi")]),
        )
        .with_bundle("https://example.test/p/B", bundle_with_attributes(&[]));
    let engine = EnrichEngine::new(
        Platform::Trendyol,
        &store,
        &extractor,
        EnrichOptions::default(),
    );
    let report = engine.run().await;

    assert_eq!(report.processed, 2);
    assert_eq!(report.errors, 0);
    assert!(store.detail(1).is_some());
    assert!(store.detail(2).is_some());
}

#[tokio::test]
async fn failed_extraction_writes_nothing_for_that_product() {
    let store = MemoryStore::new();
    store
        .upsert_product(&candidate("A", Some("https://example.test/p/A")))
        .await
        .unwrap();
    store
        .upsert_product(&candidate("B", Some("https://example.test/p/B")))
        .await
        .unwrap();

    let extractor = ScriptedDetailExtractor::new()
        .with_bundle(
            "https://example.test/p/A",
            bundle_with_attributes(&[("Renk", "Mavi")]),
        )
        .with_failure(
            "https://example.test/p/B",
            ExtractionError::DetailFetch {
                message: "selectors matched nothing".to_string(),
            },
        );
    let engine = EnrichEngine::new(
        Platform::Trendyol,
        &store,
        &extractor,
        EnrichOptions::default(),
    );
    let report = engine.run().await;

    assert_eq!(report.processed, 1);
    assert_eq!(report.errors, 1);
    assert!(report.aborted.is_none());
    assert!(store.detail(2).is_none());
    assert!(store.attributes(2).is_empty());
}

#[tokio::test]
async fn unreachable_engine_aborts_the_detail_run() {
    let store = MemoryStore::new();
    store
        .upsert_product(&candidate("A", Some("https://example.test/p/A")))
        .await
        .unwrap();
    store
        .upsert_product(&candidate("B", Some("https://example.test/p/B")))
        .await
        .unwrap();

    // Targets come newest-first, so B is visited before A.
    let extractor = ScriptedDetailExtractor::new().with_failure(
        "https://example.test/p/B",
        ExtractionError::EngineUnreachable {
            message: "browser session closed".to_string(),
        },
    );
    let engine = EnrichEngine::new(
        Platform::Trendyol,
        &store,
        &extractor,
        EnrichOptions::default(),
    );
    let report = engine.run().await;

    assert!(report.aborted.is_some());
    assert_eq!(extractor.calls(), vec!["https://example.test/p/B".to_string()]);
    assert!(store.detail(1).is_none());
}

#[tokio::test]
async fn detail_persistence_failure_is_isolated() {
    let store = MemoryStore::new();
    store
        .upsert_product(&candidate("A", Some("https://example.test/p/A")))
        .await
        .unwrap();
    store.fail_detail_saves_for(1);

    let extractor = ScriptedDetailExtractor::new().with_bundle(
        "https://example.test/p/A",
        bundle_with_attributes(&[]),
    );
    let engine = EnrichEngine::new(
        Platform::Trendyol,
        &store,
        &extractor,
        EnrichOptions::default(),
    );
    let report = engine.run().await;

    assert_eq!(report.processed, 0);
    assert_eq!(report.errors, 1);
    assert!(report.aborted.is_none());
    assert!(store.detail(1).is_none());
}

#[tokio::test]
async fn selection_skips_linkless_and_already_detailed_products() {
    let store = MemoryStore::new();
    store.upsert_product(&candidate("A", None)).await.unwrap();
    let detailed = store
        .upsert_product(&candidate("B", Some("https://example.test/p/B")))
        .await
        .unwrap();
    store
        .replace_detail(detailed.id, &bundle_with_attributes(&[]))
        .await
        .unwrap();
    store
        .upsert_product(&candidate("C", Some("https://example.test/p/C")))
        .await
        .unwrap();

    let extractor = ScriptedDetailExtractor::new().with_bundle(
        "https://example.test/p/C",
        bundle_with_attributes(&[]),
    );
    let engine = EnrichEngine::new(
        Platform::Trendyol,
        &store,
        &extractor,
        EnrichOptions::default(),
    );
    let report = engine.run().await;

    assert_eq!(report.processed, 1);
    assert_eq!(extractor.calls(), vec!["https://example.test/p/C".to_string()]);
}

#[tokio::test]
async fn repeated_attribute_names_are_deduplicated_on_write() {
    let store = MemoryStore::new();
    store
        .upsert_product(&candidate("A", Some("https://example.test/p/A")))
        .await
        .unwrap();

    let extractor = ScriptedDetailExtractor::new().with_bundle(
        "https://example.test/p/A",
        bundle_with_attributes(&[("Renk", "Mavi"), ("Renk", "Kirmizi")]),
    );
    let engine = EnrichEngine::new(
        Platform::Trendyol,
        &store,
        &extractor,
        EnrichOptions::default(),
    );
    engine.run().await;

    assert_eq!(
        store.attributes(1),
        vec![("Renk".to_string(), "Mavi".to_string())]
    );
}
