//! sqlx-backed implementation of the pipeline store.
//!
//! Write discipline per operation:
//! - identity: one conflict-aware insert, `(xmax = 0)` distinguishes an
//!   insert from an update so `is_new` comes out of the same statement
//! - listing: upsert + price-log insert in one transaction
//! - term counter: one conflict-aware increment returning the total
//! - detail: detail upsert + attribute delete/reinsert in one transaction

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row};

use crate::domain::detail::DetailBundle;
use crate::domain::errors::PersistenceError;
use crate::domain::listing::{NewObservation, ProductCandidate};
use crate::domain::platform::Platform;
use crate::domain::store::{DetailTarget, ProductStore, ProductUpsert};

const UPSERT_PRODUCT_SQL: &str = r#"
    INSERT INTO products (platform, platform_product_id, link, title, brand)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT (platform, platform_product_id) DO UPDATE
        SET link = EXCLUDED.link,
            title = EXCLUDED.title,
            brand = EXCLUDED.brand,
            updated_at = NOW()
    RETURNING id, (xmax = 0) AS inserted
"#;

const INSERT_PRICE_LOG_SQL: &str = r#"
    INSERT INTO product_price_logs (product_id, price, campaign_price, stock_status)
    VALUES ($1, $2, $3, $4)
"#;

const BUMP_TERM_SQL: &str = r#"
    INSERT INTO search_terms (term, platform, count)
    VALUES ($1, $2, $3)
    ON CONFLICT (term, platform) DO UPDATE
        SET count = search_terms.count + EXCLUDED.count
    RETURNING count
"#;

const UPSERT_DETAIL_SQL: &str = r#"
    INSERT INTO product_details
        (product_id, description, store_name, store_rating, shipping_info,
         free_shipping, rating, product_type, image_url)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
    ON CONFLICT (product_id) DO UPDATE
        SET description = EXCLUDED.description,
            store_name = EXCLUDED.store_name,
            store_rating = EXCLUDED.store_rating,
            shipping_info = EXCLUDED.shipping_info,
            free_shipping = EXCLUDED.free_shipping,
            rating = EXCLUDED.rating,
            product_type = EXCLUDED.product_type,
            image_url = EXCLUDED.image_url,
            updated_at = NOW()
"#;

const MISSING_DETAIL_SQL: &str = r#"
    SELECT p.id, p.link
    FROM products p
    WHERE p.platform = $1
      AND p.link IS NOT NULL
      AND NOT EXISTS (
          SELECT 1 FROM product_details d WHERE d.product_id = p.id
      )
    ORDER BY p.created_at DESC
"#;

/// Store implementation over the PostgreSQL schema.
#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn run_upsert<'e, E>(
    executor: E,
    candidate: &ProductCandidate,
) -> Result<ProductUpsert, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let row = sqlx::query(UPSERT_PRODUCT_SQL)
        .bind(candidate.platform.as_str())
        .bind(&candidate.platform_product_id)
        .bind(&candidate.link)
        .bind(&candidate.title)
        .bind(&candidate.brand)
        .fetch_one(executor)
        .await?;
    Ok(ProductUpsert {
        id: row.try_get("id")?,
        is_new: row.try_get("inserted")?,
    })
}

fn db_err(operation: &'static str) -> impl FnOnce(sqlx::Error) -> PersistenceError {
    move |err| PersistenceError::new(operation, err.to_string())
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn upsert_product(
        &self,
        candidate: &ProductCandidate,
    ) -> Result<ProductUpsert, PersistenceError> {
        run_upsert(&self.pool, candidate)
            .await
            .map_err(db_err("product upsert"))
    }

    async fn save_listing(
        &self,
        candidate: &ProductCandidate,
        observation: &NewObservation,
    ) -> Result<ProductUpsert, PersistenceError> {
        let mut tx = self.pool.begin().await.map_err(db_err("listing save"))?;
        let upsert = run_upsert(&mut *tx, candidate)
            .await
            .map_err(db_err("product upsert"))?;
        sqlx::query(INSERT_PRICE_LOG_SQL)
            .bind(upsert.id)
            .bind(observation.price)
            .bind(observation.campaign_price)
            .bind(&observation.stock_status)
            .execute(&mut *tx)
            .await
            .map_err(db_err("price log insert"))?;
        tx.commit().await.map_err(db_err("listing save"))?;
        Ok(upsert)
    }

    async fn bump_term_count(
        &self,
        term: &str,
        platform: Platform,
        new_products: u32,
    ) -> Result<i64, PersistenceError> {
        let row = sqlx::query(BUMP_TERM_SQL)
            .bind(term)
            .bind(platform.as_str())
            .bind(i64::from(new_products))
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("search term counter"))?;
        row.try_get("count").map_err(db_err("search term counter"))
    }

    async fn replace_detail(
        &self,
        product_id: i64,
        bundle: &DetailBundle,
    ) -> Result<(), PersistenceError> {
        let mut tx = self.pool.begin().await.map_err(db_err("detail replace"))?;
        sqlx::query(UPSERT_DETAIL_SQL)
            .bind(product_id)
            .bind(&bundle.description)
            .bind(&bundle.store_name)
            .bind(bundle.store_rating.unwrap_or(0.0))
            .bind(&bundle.shipping_info)
            .bind(bundle.free_shipping)
            .bind(bundle.rating.unwrap_or(0.0))
            .bind(&bundle.product_type)
            .bind(&bundle.image_url)
            .execute(&mut *tx)
            .await
            .map_err(db_err("detail upsert"))?;
        sqlx::query("DELETE FROM product_attributes WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err("attribute delete"))?;
        for (name, value) in bundle.deduped_attributes() {
            sqlx::query(
                "INSERT INTO product_attributes (product_id, attribute_name, attribute_value) \
                 VALUES ($1, $2, $3)",
            )
            .bind(product_id)
            .bind(&name)
            .bind(&value)
            .execute(&mut *tx)
            .await
            .map_err(db_err("attribute insert"))?;
        }
        tx.commit().await.map_err(db_err("detail replace"))?;
        Ok(())
    }

    async fn products_missing_detail(
        &self,
        platform: Platform,
    ) -> Result<Vec<DetailTarget>, PersistenceError> {
        let rows = sqlx::query(MISSING_DETAIL_SQL)
            .bind(platform.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("missing-detail selection"))?;
        rows.into_iter()
            .map(|row| {
                Ok(DetailTarget {
                    product_id: row.try_get("id").map_err(db_err("missing-detail selection"))?,
                    link: row
                        .try_get("link")
                        .map_err(db_err("missing-detail selection"))?,
                })
            })
            .collect()
    }
}
