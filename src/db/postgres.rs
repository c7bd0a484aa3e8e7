use async_trait::async_trait;

use crate::{
    db::LinksDB,
    db_pool::DbPool,
    models::{NewShortLink, ShortLink},
    schema,
};

#[derive(Clone)]
pub struct PostgresDb {
    db: DbPool,
}

impl PostgresDb {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LinksDB for PostgresDb {
    async fn create(&self, link: &NewShortLink) -> Result<ShortLink, super::DbError> {
        use diesel::SelectableHelper;
        use diesel_async::RunQueryDsl;

        Ok(diesel::insert_into(schema::short_links::table)
            .values(link)
            .returning(ShortLink::as_returning())
            .get_result(&mut self.db.0.get().await?)
            .await?)
    }

    async fn get(&self, short_code: &str) -> Result<Option<ShortLink>, super::DbError> {
        use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
        use diesel_async::RunQueryDsl;

        Ok(schema::short_links::table
            .filter(schema::short_links::short_code.eq(short_code))
            .select(ShortLink::as_select())
            .first(&mut self.db.0.get().await?)
            .await
            .optional()?)
    }

    async fn increment_clicks(&self, short_code: &str) -> Result<(), super::DbError> {
        use diesel::{ExpressionMethods, QueryDsl};
        use diesel_async::RunQueryDsl;
        use crate::schema::short_links::dsl;

        diesel::update(dsl::short_links.filter(dsl::short_code.eq(short_code)))
            .set(dsl::clicks.eq(dsl::clicks + 1))
            .execute(&mut self.db.0.get().await?)
            .await?;

        Ok(())
    }
}
