// src/api/catalog.rs

use std::collections::HashSet;

use reqwest::Method;

use crate::{
    api::{ApiClient, require_tryout_id},
    config::PACKAGES_PER_PAGE,
    error::AppError,
    models::tryout::{OwnedPackage, Package, Tryout},
};

/// One page of a listing; pages are 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
}

/// Slices `items` into pages of [`PACKAGES_PER_PAGE`]. Out-of-range pages
/// are clamped to the last one.
pub fn paginate<T: Clone>(items: &[T], page: usize) -> Page<T> {
    let total_pages = items.len().div_ceil(PACKAGES_PER_PAGE).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * PACKAGES_PER_PAGE;
    let end = (start + PACKAGES_PER_PAGE).min(items.len());

    Page {
        items: items[start.min(end)..end].to_vec(),
        page,
        total_pages,
    }
}

/// Catalog packages the user does not own yet.
pub fn available_packages(all: Vec<Package>, owned: &[OwnedPackage]) -> Vec<Package> {
    let owned_ids: HashSet<&str> = owned.iter().map(|p| p.id.as_str()).collect();
    all.into_iter()
        .filter(|p| !owned_ids.contains(p.id.as_str()))
        .collect()
}

impl ApiClient {
    /// Public package catalog. No token required.
    pub async fn list_packages(&self) -> Result<Vec<Package>, AppError> {
        let url = self.endpoint(&["pakets"]);
        self.send_json(self.request(Method::GET, url)).await
    }

    /// Packages purchased by the current user.
    pub async fn list_owned_packages(&self) -> Result<Vec<OwnedPackage>, AppError> {
        let url = self.endpoint(&["user-pakets"]);
        self.send_json(self.authed(Method::GET, url)?).await
    }

    pub async fn list_tryouts(&self) -> Result<Vec<Tryout>, AppError> {
        let url = self.endpoint(&["tryouts"]);
        self.send_json(self.authed(Method::GET, url)?).await
    }

    /// Tryouts that belong to one package.
    pub async fn list_package_tryouts(&self, package_id: &str) -> Result<Vec<Tryout>, AppError> {
        if package_id.trim().is_empty() {
            return Err(AppError::MissingParameter("paketId".to_string()));
        }
        let tryouts = self.list_tryouts().await?;
        Ok(tryouts
            .into_iter()
            .filter(|t| t.paket_id == package_id.trim())
            .collect())
    }

    /// Catalog minus the packages already bought.
    pub async fn list_available_packages(&self) -> Result<Vec<Package>, AppError> {
        let all = self.list_packages().await?;
        let owned = self.list_owned_packages().await?;
        Ok(available_packages(all, &owned))
    }

    pub async fn get_tryout(&self, tryout_id: &str) -> Result<Tryout, AppError> {
        let tryout_id = require_tryout_id(tryout_id)?;
        let url = self.endpoint(&["tryouts", tryout_id]);
        self.send_json(self.authed(Method::GET, url)?).await
    }
}
