//! Site-owner profile, a single logical row

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder};

use crate::errors::Result;
use crate::storage::Storage;

use migration::entities::profile;

#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub social_links: Option<BTreeMap<String, String>>,
    pub email: Option<String>,
    pub location: Option<String>,
}

pub struct ProfileService {
    storage: Arc<Storage>,
}

impl ProfileService {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn get(&self) -> Result<Option<profile::Model>> {
        Ok(profile::Entity::find()
            .order_by_asc(profile::Column::Id)
            .one(self.storage.get_db())
            .await?)
    }

    /// Upsert: updates the existing row or creates the first one
    pub async fn update(&self, patch: ProfilePatch) -> Result<profile::Model> {
        let db = self.storage.get_db();
        let existing = profile::Entity::find()
            .order_by_asc(profile::Column::Id)
            .one(db)
            .await?;

        let now = Utc::now();

        match existing {
            Some(existing) => {
                let mut model: profile::ActiveModel = existing.into();
                if let Some(display_name) = patch.display_name {
                    model.display_name = Set(display_name);
                }
                if let Some(headline) = patch.headline {
                    model.headline = Set(Some(headline));
                }
                if let Some(bio) = patch.bio {
                    model.bio = Set(Some(bio));
                }
                if let Some(skills) = patch.skills {
                    model.skills = Set(serde_json::to_string(&skills)?);
                }
                if let Some(social_links) = patch.social_links {
                    model.social_links = Set(serde_json::to_string(&social_links)?);
                }
                if let Some(email) = patch.email {
                    model.email = Set(Some(email));
                }
                if let Some(location) = patch.location {
                    model.location = Set(Some(location));
                }
                model.updated_at = Set(now);
                Ok(model.update(db).await?)
            }
            None => {
                let model = profile::ActiveModel {
                    display_name: Set(patch.display_name.unwrap_or_default()),
                    headline: Set(patch.headline),
                    bio: Set(patch.bio),
                    skills: Set(serde_json::to_string(
                        &patch.skills.unwrap_or_default(),
                    )?),
                    social_links: Set(serde_json::to_string(
                        &patch.social_links.unwrap_or_default(),
                    )?),
                    email: Set(patch.email),
                    location: Set(patch.location),
                    updated_at: Set(now),
                    ..Default::default()
                };
                Ok(model.insert(db).await?)
            }
        }
    }
}
