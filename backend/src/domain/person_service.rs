//! Person graph service.
//!
//! Relationship edges are denormalized onto both endpoints, and this service
//! is the single writer that keeps them mirrored. Writes follow a fixed
//! shape: persist the person document first, then push the implied edges
//! onto the neighbors one by one. Each neighbor write is best-effort; a
//! failure is logged and the remaining edges are still attempted, so a
//! partially linked graph heals on the next write touching the same edge.
//! Delete is the exception: unlinking runs inside one transaction so a
//! half-removed person is never visible.

use chrono::Utc;
use tracing::warn;

use crate::domain::models::person::{
    CreatePersonRequest, FamilyInfo, Person, UpdatePersonRequest,
};
use crate::error::AppError;
use crate::ids::new_object_id;
use crate::storage::person_repository::{ParentColumn, PersonRepository};
use crate::text::normalize_text;

#[derive(Clone)]
pub struct PersonService {
    repository: PersonRepository,
}

impl PersonService {
    pub fn new(repository: PersonRepository) -> Self {
        Self { repository }
    }

    pub async fn create(&self, request: CreatePersonRequest) -> Result<Person, AppError> {
        if request.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }

        let now = Utc::now();
        let person = Person {
            id: new_object_id(),
            name_normalized: normalize_text(&request.name),
            alias_normalized: request.alias.as_deref().map(normalize_text),
            name: request.name,
            alias: request.alias,
            gender: request.gender,
            birth_date: request.birth_date,
            birth_year_can_chi: request.birth_year_can_chi,
            death_date: request.death_date,
            death_year_can_chi: request.death_year_can_chi,
            image_url: request.image_url,
            father_id: request.father_id,
            mother_id: request.mother_id,
            spouse_ids: request.spouse_ids,
            children_ids: request.children_ids,
            created_at: now,
            updated_at: now,
        };

        self.repository.insert(&person).await?;
        self.sync_relationships(&person).await;
        Ok(person)
    }

    /// Sparse merge onto the stored document, then the same edge sync as
    /// create. Edges dropped from the request are not retracted from the
    /// old neighbors.
    pub async fn update(&self, request: UpdatePersonRequest) -> Result<Person, AppError> {
        let mut person = self
            .repository
            .get_by_id(&request.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Person not found".to_string()))?;

        if let Some(name) = request.name {
            person.name_normalized = normalize_text(&name);
            person.name = name;
        }
        if let Some(alias) = request.alias {
            person.alias_normalized = Some(normalize_text(&alias));
            person.alias = Some(alias);
        }
        if let Some(gender) = request.gender {
            person.gender = gender;
        }
        if let Some(birth_date) = request.birth_date {
            person.birth_date = Some(birth_date);
        }
        if let Some(birth_year_can_chi) = request.birth_year_can_chi {
            person.birth_year_can_chi = Some(birth_year_can_chi);
        }
        if let Some(death_date) = request.death_date {
            person.death_date = Some(death_date);
        }
        if let Some(death_year_can_chi) = request.death_year_can_chi {
            person.death_year_can_chi = Some(death_year_can_chi);
        }
        if let Some(image_url) = request.image_url {
            person.image_url = Some(image_url);
        }
        if let Some(father_id) = request.father_id {
            person.father_id = Some(father_id);
        }
        if let Some(mother_id) = request.mother_id {
            person.mother_id = Some(mother_id);
        }
        if let Some(spouse_ids) = request.spouse_ids {
            person.spouse_ids = spouse_ids;
        }
        if let Some(children_ids) = request.children_ids {
            person.children_ids = children_ids;
        }
        person.updated_at = Utc::now();

        self.repository.replace(&person).await?;
        self.sync_relationships(&person).await;
        Ok(person)
    }

    /// Deleting an id that matches nothing succeeds; otherwise the cascade
    /// runs transactionally.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let Some(person) = self.repository.get_by_id(id).await? else {
            return Ok(());
        };
        self.repository.delete_cascade(&person).await?;
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Person, AppError> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Person not found".to_string()))
    }

    /// The person plus both parents, spouses, and children in one bundle.
    /// Parent lookups run concurrently and swallow failures into absence.
    pub async fn family_info(&self, id: &str) -> Result<FamilyInfo, AppError> {
        let person = self.get(id).await?;

        let fetch_parent = |parent_id: Option<String>| async move {
            match parent_id {
                Some(parent_id) => self
                    .repository
                    .get_by_id(&parent_id)
                    .await
                    .unwrap_or_else(|e| {
                        warn!("parent lookup failed for {}: {:#}", parent_id, e);
                        None
                    }),
                None => None,
            }
        };
        let (father, mother) = tokio::join!(
            fetch_parent(person.father_id.clone()),
            fetch_parent(person.mother_id.clone()),
        );

        let spouses = self.repository.by_ids(&person.spouse_ids).await?;
        let children = self.repository.children_of(&person.id).await?;

        Ok(FamilyInfo {
            person,
            father,
            mother,
            spouses,
            children,
        })
    }

    pub async fn search(&self, keyword: &str, limit: i64) -> Result<Vec<Person>, AppError> {
        if keyword.trim().is_empty() {
            return Err(AppError::Validation("Keyword is required".to_string()));
        }
        let normalized = normalize_text(keyword);
        Ok(self
            .repository
            .search_by_name_or_alias(&normalized, limit)
            .await?)
    }

    /// Push this person's edges onto the neighbors: join the parents'
    /// children lists, mirror the spouse edges, and point each listed child
    /// back at this person through the pointer matching the gender. Any
    /// gender outside male/female skips the child pointers.
    async fn sync_relationships(&self, person: &Person) {
        if let Some(father_id) = &person.father_id {
            if let Err(e) = self.repository.add_child_edge(father_id, &person.id).await {
                warn!("father edge sync failed for {}: {:#}", person.id, e);
            }
        }
        if let Some(mother_id) = &person.mother_id {
            if let Err(e) = self.repository.add_child_edge(mother_id, &person.id).await {
                warn!("mother edge sync failed for {}: {:#}", person.id, e);
            }
        }

        for spouse_id in &person.spouse_ids {
            if let Err(e) = self.repository.add_spouse_edge(spouse_id, &person.id).await {
                warn!("spouse edge sync failed for {}: {:#}", person.id, e);
            }
        }

        let column = if person.is_male() {
            Some(ParentColumn::Father)
        } else if person.is_female() {
            Some(ParentColumn::Mother)
        } else {
            None
        };
        if let Some(column) = column {
            for child_id in &person.children_ids {
                if let Err(e) = self.repository.set_parent(child_id, column, &person.id).await {
                    warn!("child edge sync failed for {}: {:#}", person.id, e);
                }
            }
        }
    }
}
