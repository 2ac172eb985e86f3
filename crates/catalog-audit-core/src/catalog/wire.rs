//! Response shapes of the collection API.
//!
//! The detail endpoint answers either `{data: {images: [...]}}` or
//! `{data: {collection: {gallery: [...]}}}`; both decode into the same
//! [`CollectionPayload`].

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub data: ListData,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListData {
    #[serde(default)]
    pub collections: Vec<CollectionPayload>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DetailResponse {
    #[serde(default)]
    pub data: DetailData,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DetailData {
    Nested { collection: CollectionPayload },
    Flat(CollectionPayload),
}

impl Default for DetailData {
    fn default() -> Self {
        DetailData::Flat(CollectionPayload::default())
    }
}

impl DetailData {
    pub fn into_collection(self) -> CollectionPayload {
        match self {
            DetailData::Nested { collection } => collection,
            DetailData::Flat(collection) => collection,
        }
    }
}

/// Summary fields from the list endpoint plus the media fields only the
/// detail endpoint fills in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPayload {
    pub slug: Option<String>,
    pub hero_image: Option<String>,
    pub image_count: Option<u64>,
    pub video_count: Option<u64>,
    #[serde(default)]
    pub subcollections: Vec<SubcollectionRef>,
    pub config: Option<Value>,
    pub has_config: Option<bool>,
    pub images: Option<Vec<MediaItem>>,
    pub gallery: Option<Vec<MediaItem>>,
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SubcollectionRef {
    Slug(String),
    Object { slug: String },
}

impl SubcollectionRef {
    pub fn slug(&self) -> &str {
        match self {
            SubcollectionRef::Slug(slug) => slug,
            SubcollectionRef::Object { slug } => slug,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MediaItem {
    Entry(MediaEntry),
    Name(String),
    Other(Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaEntry {
    pub filename: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl MediaItem {
    pub fn name(&self) -> Option<&str> {
        match self {
            MediaItem::Entry(entry) => entry.filename.as_deref(),
            MediaItem::Name(name) => Some(name),
            MediaItem::Other(_) => None,
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, MediaItem::Entry(MediaEntry { kind: Some(kind), .. }) if kind == "video")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    pub total: Option<u64>,
}

impl CollectionPayload {
    /// Media list from whichever response shape carried it.
    pub fn media(&self) -> Option<&[MediaItem]> {
        self.gallery.as_deref().or(self.images.as_deref())
    }

    /// Metadata worth comparing. The API serializes a missing config as `{}`
    /// and may say so explicitly through `hasConfig`.
    pub fn effective_config(&self) -> Option<&Value> {
        if self.has_config == Some(false) {
            return None;
        }
        match &self.config {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) if map.is_empty() => None,
            Some(value) => Some(value),
        }
    }

    /// Fill fields this summary lacks from a detail payload. Summary values win.
    pub fn with_detail(mut self, detail: CollectionPayload) -> Self {
        let take_config = self.effective_config().is_none() && detail.effective_config().is_some();

        self.slug = self.slug.or(detail.slug);
        self.hero_image = self.hero_image.or(detail.hero_image);
        self.image_count = self.image_count.or(detail.image_count);
        self.video_count = self.video_count.or(detail.video_count);
        if self.subcollections.is_empty() {
            self.subcollections = detail.subcollections;
        }
        if take_config {
            self.config = detail.config;
            self.has_config = detail.has_config;
        }
        self.images = self.images.or(detail.images);
        self.gallery = self.gallery.or(detail.gallery);
        self.pagination = self.pagination.or(detail.pagination);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detail_accepts_flat_shape() {
        let body = json!({ "data": { "slug": "cafe", "images": ["a.jpg", "b.jpg"] } });
        let detail: DetailResponse = serde_json::from_value(body).unwrap();
        let collection = detail.data.into_collection();
        assert_eq!(collection.slug.as_deref(), Some("cafe"));
        assert_eq!(collection.media().map(|m| m.len()), Some(2));
    }

    #[test]
    fn test_detail_accepts_nested_shape() {
        let body = json!({
            "success": true,
            "data": { "collection": {
                "slug": "cafe-coffee",
                "gallery": [
                    { "filename": "a.jpg", "type": "image" },
                    { "filename": "b.mp4", "type": "video" }
                ],
                "pagination": { "total": 2 },
                "subcollections": []
            } }
        });
        let detail: DetailResponse = serde_json::from_value(body).unwrap();
        let collection = detail.data.into_collection();
        assert_eq!(collection.slug.as_deref(), Some("cafe-coffee"));
        let media = collection.media().unwrap();
        assert_eq!(media[0].name(), Some("a.jpg"));
        assert!(media[1].is_video());
        assert_eq!(collection.pagination.and_then(|p| p.total), Some(2));
    }

    #[test]
    fn test_list_tolerates_missing_data() {
        let list: ListResponse = serde_json::from_value(json!({ "success": true })).unwrap();
        assert!(list.data.collections.is_empty());
    }

    #[test]
    fn test_subcollections_accept_slugs_and_objects() {
        let payload: CollectionPayload = serde_json::from_value(json!({
            "slug": "gynoids",
            "subcollections": ["gynoids-bugs", { "slug": "gynoids-horses" }]
        }))
        .unwrap();
        let slugs: Vec<&str> = payload.subcollections.iter().map(|s| s.slug()).collect();
        assert_eq!(slugs, vec!["gynoids-bugs", "gynoids-horses"]);
    }

    #[test]
    fn test_empty_config_counts_as_absent() {
        let empty: CollectionPayload =
            serde_json::from_value(json!({ "slug": "a", "config": {} })).unwrap();
        assert!(empty.effective_config().is_none());

        let flagged: CollectionPayload = serde_json::from_value(
            json!({ "slug": "a", "config": { "title": "x" }, "hasConfig": false }),
        )
        .unwrap();
        assert!(flagged.effective_config().is_none());

        let real: CollectionPayload =
            serde_json::from_value(json!({ "slug": "a", "config": { "title": "x" } })).unwrap();
        assert_eq!(real.effective_config(), Some(&json!({ "title": "x" })));
    }

    #[test]
    fn test_with_detail_prefers_summary_values() {
        let summary: CollectionPayload = serde_json::from_value(
            json!({ "slug": "a", "imageCount": 7, "subcollections": ["a-b"] }),
        )
        .unwrap();
        let detail: CollectionPayload = serde_json::from_value(json!({
            "slug": "a", "imageCount": 3, "heroImage": "hero.jpg", "images": ["x.jpg"]
        }))
        .unwrap();

        let merged = summary.with_detail(detail);
        assert_eq!(merged.image_count, Some(7));
        assert_eq!(merged.hero_image.as_deref(), Some("hero.jpg"));
        assert_eq!(merged.subcollections.len(), 1);
        assert_eq!(merged.media().map(|m| m.len()), Some(1));
    }
}
