use chrono::{DateTime, Utc};
use diesel::prelude::*;

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name = crate::schema::short_links)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewShortLink {
    pub short_code: String,
    pub original_url: String,
    pub clicks: i32,
    pub created_at: DateTime<Utc>,
}

impl NewShortLink {
    pub fn new(short_code: String, original_url: String) -> Self {
        Self {
            short_code,
            original_url,
            clicks: 0,
            created_at: Utc::now(),
        }
    }
}

#[derive(Queryable, Selectable, Clone, PartialEq, Eq, Debug)]
#[diesel(table_name = crate::schema::short_links)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShortLink {
    pub id: i32,
    pub short_code: String,
    pub original_url: String,
    pub clicks: i32,
    pub created_at: DateTime<Utc>,
}

impl ShortLink {
    pub fn from_new(id: i32, link: &NewShortLink) -> Self {
        Self {
            id,
            short_code: link.short_code.clone(),
            original_url: link.original_url.clone(),
            clicks: link.clicks,
            created_at: link.created_at,
        }
    }
}
