//! Asset manifest and loader
//!
//! A fixed set of named sprite and audio URIs is loaded concurrently; the
//! batch completes exactly once, after every resource has either loaded or
//! failed. A failed asset is logged and recorded as absent for the rest of
//! the run; rendering substitutes fallback visuals and playback skips it.
//! The simulation never waits on or reads assets.

/// Well-known resources the game renders and plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKey {
    BowSprite,
    ArrowSprite,
    TargetSprite,
    Background,
    ReleaseSound,
    ImpactSound,
}

impl AssetKey {
    pub fn is_audio(self) -> bool {
        matches!(self, AssetKey::ReleaseSound | AssetKey::ImpactSound)
    }
}

/// Named resource URIs, defaulting to the shipped asset paths
#[derive(Debug, Clone)]
pub struct AssetManifest {
    entries: Vec<(AssetKey, String)>,
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self {
            entries: vec![
                (AssetKey::BowSprite, "/assets/bow-sprite.png".into()),
                (AssetKey::ArrowSprite, "/assets/arrow-sprite.png".into()),
                (AssetKey::TargetSprite, "/assets/target-sprite.png".into()),
                (AssetKey::Background, "/assets/stadium-background.png".into()),
                (AssetKey::ReleaseSound, "/assets/arrow-release.mp3".into()),
                (AssetKey::ImpactSound, "/assets/arrow-impact.mp3".into()),
            ],
        }
    }
}

impl AssetManifest {
    pub fn entries(&self) -> &[(AssetKey, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Override a single resource URI
    pub fn with_uri(mut self, key: AssetKey, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = uri;
        } else {
            self.entries.push((key, uri));
        }
        self
    }
}

#[cfg(target_arch = "wasm32")]
pub use loader::{AssetStore, load_all};

#[cfg(target_arch = "wasm32")]
mod loader {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use futures::channel::oneshot;
    use futures::future::join_all;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;
    use web_sys::{HtmlAudioElement, HtmlImageElement};

    use super::{AssetKey, AssetManifest};

    enum Handle {
        Image(HtmlImageElement),
        Audio(HtmlAudioElement),
    }

    /// Loaded resources; a missing key means that asset failed to load
    #[derive(Default)]
    pub struct AssetStore {
        loaded: HashMap<AssetKey, Handle>,
    }

    impl AssetStore {
        pub fn image(&self, key: AssetKey) -> Option<&HtmlImageElement> {
            match self.loaded.get(&key) {
                Some(Handle::Image(image)) => Some(image),
                _ => None,
            }
        }

        pub fn audio(&self, key: AssetKey) -> Option<&HtmlAudioElement> {
            match self.loaded.get(&key) {
                Some(Handle::Audio(audio)) => Some(audio),
                _ => None,
            }
        }

        pub fn contains(&self, key: AssetKey) -> bool {
            self.loaded.contains_key(&key)
        }
    }

    /// Fetch every manifest entry concurrently and settle once all are done.
    /// Individual failures are logged and left absent; they never abort the
    /// batch and there are no retries.
    pub async fn load_all(manifest: &AssetManifest) -> AssetStore {
        let pending: Vec<_> = manifest
            .entries()
            .iter()
            .map(|(key, uri)| load_one(*key, uri.clone()))
            .collect();

        let mut store = AssetStore::default();
        for (key, result) in join_all(pending).await {
            match result {
                Some(handle) => {
                    store.loaded.insert(key, handle);
                }
                None => log::warn!("asset {key:?} failed to load; using fallback"),
            }
        }
        log::info!(
            "asset batch settled: {}/{} loaded",
            store.loaded.len(),
            manifest.len()
        );
        store
    }

    async fn load_one(key: AssetKey, uri: String) -> (AssetKey, Option<Handle>) {
        let handle = if key.is_audio() {
            load_audio(&uri).await.map(Handle::Audio)
        } else {
            load_image(&uri).await.map(Handle::Image)
        };
        (key, handle)
    }

    /// Resolve once the image either loads or errors. The sender is shared
    /// between the two callbacks; whichever fires first wins.
    async fn load_image(uri: &str) -> Option<HtmlImageElement> {
        let image = HtmlImageElement::new().ok()?;
        let (tx, rx) = oneshot::channel::<bool>();
        let success_tx = Rc::new(RefCell::new(Some(tx)));
        let error_tx = success_tx.clone();

        let on_load = Closure::once(move || {
            if let Some(tx) = success_tx.borrow_mut().take() {
                let _ = tx.send(true);
            }
        });
        let on_error = Closure::once(move |_event: web_sys::Event| {
            if let Some(tx) = error_tx.borrow_mut().take() {
                let _ = tx.send(false);
            }
        });

        image.set_onload(Some(on_load.as_ref().unchecked_ref()));
        image.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        image.set_src(uri);

        // Keep the callbacks alive until the browser fires one of them
        on_load.forget();
        on_error.forget();

        match rx.await {
            Ok(true) => Some(image),
            _ => None,
        }
    }

    async fn load_audio(uri: &str) -> Option<HtmlAudioElement> {
        let audio = HtmlAudioElement::new_with_src(uri).ok()?;
        let (tx, rx) = oneshot::channel::<bool>();
        let success_tx = Rc::new(RefCell::new(Some(tx)));
        let error_tx = success_tx.clone();

        let on_ready = Closure::once(move |_event: web_sys::Event| {
            if let Some(tx) = success_tx.borrow_mut().take() {
                let _ = tx.send(true);
            }
        });
        let on_error = Closure::once(move |_event: web_sys::Event| {
            if let Some(tx) = error_tx.borrow_mut().take() {
                let _ = tx.send(false);
            }
        });

        let target: &web_sys::EventTarget = audio.as_ref();
        let _ = target
            .add_event_listener_with_callback("canplaythrough", on_ready.as_ref().unchecked_ref());
        let _ = target.add_event_listener_with_callback("error", on_error.as_ref().unchecked_ref());
        audio.load();

        on_ready.forget();
        on_error.forget();

        match rx.await {
            Ok(true) => Some(audio),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest_names_every_asset() {
        let manifest = AssetManifest::default();
        assert_eq!(manifest.len(), 6);
        for key in [
            AssetKey::BowSprite,
            AssetKey::ArrowSprite,
            AssetKey::TargetSprite,
            AssetKey::Background,
            AssetKey::ReleaseSound,
            AssetKey::ImpactSound,
        ] {
            assert!(manifest.entries().iter().any(|(k, _)| *k == key));
        }
    }

    #[test]
    fn test_audio_classification() {
        assert!(AssetKey::ImpactSound.is_audio());
        assert!(AssetKey::ReleaseSound.is_audio());
        assert!(!AssetKey::BowSprite.is_audio());
    }

    #[test]
    fn test_with_uri_overrides_in_place() {
        let manifest = AssetManifest::default().with_uri(AssetKey::BowSprite, "/cdn/bow.png");
        assert_eq!(manifest.len(), 6);
        let uri = manifest
            .entries()
            .iter()
            .find(|(k, _)| *k == AssetKey::BowSprite)
            .map(|(_, uri)| uri.as_str());
        assert_eq!(uri, Some("/cdn/bow.png"));
    }
}
