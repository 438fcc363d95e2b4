use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use validator::Validate;

use crate::models::{normalize_site_name, ChatId, NewWatchedProduct, WatchedProduct, WatchedSite};
use crate::utils::error::{AppError, Result};

const PRODUCTS_FILE: &str = "products.json";
const SITES_FILE: &str = "sites.json";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreSettings {
    #[serde(default)]
    pub chat_id: Option<ChatId>,
}

/// Watched products, sites and the notification destination, kept as JSON
/// files in one directory. Files are re-read on every call.
pub struct WatchStore {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl WatchStore {
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir).await?;
        tracing::debug!("Watch store at {}", data_dir.display());

        let store = Self {
            data_dir,
            write_lock: Mutex::new(()),
        };
        store.assign_missing_ids::<WatchedProduct>(PRODUCTS_FILE).await?;
        store.assign_missing_ids::<WatchedSite>(SITES_FILE).await?;
        Ok(store)
    }

    /// Entries written before ids existed get one, persisted so deletion by id
    /// stays stable between reads.
    async fn assign_missing_ids<T>(&self, file: &str) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        let raw: Vec<serde_json::Value> = self.read_json(file).await?;
        if raw.iter().all(|entry| entry.get("id").is_some()) {
            return Ok(());
        }

        let entries = raw
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<T>, _>>()?;
        self.write_json(file, &entries).await?;
        tracing::info!("Assigned ids to entries in {}", file);
        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub async fn list_products(&self) -> Result<Vec<WatchedProduct>> {
        self.read_json(PRODUCTS_FILE).await
    }

    pub async fn add_product(&self, new_product: NewWatchedProduct) -> Result<WatchedProduct> {
        new_product.validate()?;

        let _guard = self.write_lock.lock().await;
        let mut products: Vec<WatchedProduct> = self.read_json(PRODUCTS_FILE).await?;
        let product = WatchedProduct::new(new_product);
        products.push(product.clone());
        self.write_json(PRODUCTS_FILE, &products).await?;

        tracing::info!("Added product '{}' (max {})", product.name, product.max_price);
        Ok(product)
    }

    pub async fn remove_product(&self, id: &str) -> Result<WatchedProduct> {
        let _guard = self.write_lock.lock().await;
        let mut products: Vec<WatchedProduct> = self.read_json(PRODUCTS_FILE).await?;
        let index = products
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound {
                resource: format!("product {}", id),
            })?;
        let removed = products.remove(index);
        self.write_json(PRODUCTS_FILE, &products).await?;

        tracing::info!("Removed product '{}'", removed.name);
        Ok(removed)
    }

    pub async fn list_sites(&self) -> Result<Vec<WatchedSite>> {
        self.read_json(SITES_FILE).await
    }

    pub async fn add_site(&self, name: &str) -> Result<WatchedSite> {
        let name = normalize_site_name(name);
        if name.is_empty() {
            return Err(AppError::Validation("Site name must not be empty".into()));
        }

        let _guard = self.write_lock.lock().await;
        let mut sites: Vec<WatchedSite> = self.read_json(SITES_FILE).await?;
        if sites.iter().any(|s| s.name == name) {
            return Err(AppError::Duplicate(format!("site {}", name)));
        }
        let site = WatchedSite::new(&name);
        sites.push(site.clone());
        self.write_json(SITES_FILE, &sites).await?;

        tracing::info!("Added site '{}'", site.name);
        Ok(site)
    }

    pub async fn remove_site(&self, id: &str) -> Result<WatchedSite> {
        let _guard = self.write_lock.lock().await;
        let mut sites: Vec<WatchedSite> = self.read_json(SITES_FILE).await?;
        let index = sites
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound {
                resource: format!("site {}", id),
            })?;
        let removed = sites.remove(index);
        self.write_json(SITES_FILE, &sites).await?;

        tracing::info!("Removed site '{}'", removed.name);
        Ok(removed)
    }

    pub async fn chat_id(&self) -> Result<Option<ChatId>> {
        let settings: StoreSettings = self.read_json(SETTINGS_FILE).await?;
        Ok(settings.chat_id)
    }

    pub async fn set_chat_id(&self, chat_id: ChatId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut settings: StoreSettings = self.read_json(SETTINGS_FILE).await?;
        if settings.chat_id != Some(chat_id) {
            settings.chat_id = Some(chat_id);
            self.write_json(SETTINGS_FILE, &settings).await?;
            tracing::info!("Notification destination set to chat {}", chat_id);
        }
        Ok(())
    }

    async fn read_json<T: DeserializeOwned + Default>(&self, file: &str) -> Result<T> {
        let path = self.data_dir.join(file);
        match fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(T::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(e.into()),
        }
    }

    // Sibling temp file, then rename
    async fn write_json<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.data_dir.join(file);
        let tmp_path = self.data_dir.join(format!("{}.tmp", file));

        let mut bytes = serde_json::to_vec_pretty(value)?;
        bytes.push(b'\n');
        fs::write(&tmp_path, &bytes).await?;
        fs::rename(&tmp_path, &path).await?;
        Ok(())
    }
}
