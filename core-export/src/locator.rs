//! # Payload Locator
//!
//! Fetches the compressed bytes of a clip, wherever the container put them.

use crate::clip::{AudioClip, ClipPayload, StreamedResource};
use crate::error::LocatorError;
use bridge_traits::storage::ResourceResolver;
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

/// Compressed clip data, owned and immutable.
///
/// Inline payloads share the clip's buffer (`Bytes` is reference counted), so
/// the data outlives any decode session built on top of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedPayload {
    data: Bytes,
}

impl CompressedPayload {
    pub fn new(data: Bytes) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

/// Locates the compressed payload of a clip.
///
/// Performs no decoding and no format validation.
pub struct RawPayloadLocator {
    resolver: Arc<dyn ResourceResolver>,
}

impl RawPayloadLocator {
    pub fn new(resolver: Arc<dyn ResourceResolver>) -> Self {
        Self { resolver }
    }

    /// Return the exact compressed bytes of `clip`.
    ///
    /// # Errors
    ///
    /// - [`LocatorError::ResourceNotFound`] - the resolver has no such file;
    ///   no read is issued
    /// - [`LocatorError::UnknownPayloadSize`] - the version does not encode
    ///   the payload length
    /// - [`LocatorError::Read`] - the file is shorter than `offset + size`
    pub fn locate(&self, clip: &AudioClip) -> Result<CompressedPayload, LocatorError> {
        match clip.payload() {
            ClipPayload::Inline(data) => {
                debug!(clip = clip.name(), size = data.len(), "Using inline payload");
                Ok(CompressedPayload::new(data.clone()))
            }
            ClipPayload::External(resource) => self.read_external(clip.name(), resource),
        }
    }

    fn read_external(
        &self,
        clip: &str,
        resource: &StreamedResource,
    ) -> Result<CompressedPayload, LocatorError> {
        let file = self
            .resolver
            .find_resource_file(&resource.source)
            .ok_or_else(|| LocatorError::ResourceNotFound {
                clip: clip.to_string(),
                resource: resource.source.clone(),
            })?;

        let size = resource
            .size
            .ok_or_else(|| LocatorError::UnknownPayloadSize {
                clip: clip.to_string(),
            })?;

        let len = usize::try_from(size).map_err(|_| LocatorError::PayloadTooLarge {
            clip: clip.to_string(),
            size,
        })?;

        let data = file
            .read_at(resource.offset, len)
            .map_err(|source| LocatorError::Read {
                clip: clip.to_string(),
                resource: resource.source.clone(),
                source,
            })?;

        debug!(
            clip,
            resource = %resource.source,
            offset = resource.offset,
            size,
            "Read payload from resource file"
        );

        Ok(CompressedPayload::new(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::UnityVersion;
    use bridge_traits::storage::{InMemoryResourceResolver, ResourceFile};

    struct PanickingResolver;

    impl ResourceResolver for PanickingResolver {
        fn find_resource_file(&self, source: &str) -> Option<Arc<ResourceFile>> {
            panic!("inline clips must not resolve resources (asked for {})", source);
        }
    }

    fn external_clip(source: &str, offset: u64, size: Option<u64>) -> AudioClip {
        AudioClip::new(
            "ambience",
            UnityVersion::new(2017, 4, 0),
            1,
            ClipPayload::External(StreamedResource::new(source, offset, size)),
        )
        .unwrap()
    }

    #[test]
    fn test_inline_payload_is_returned_as_is() {
        let data = Bytes::from_static(b"OggS\0\x02payload");
        let clip = AudioClip::new(
            "jingle",
            UnityVersion::new(4, 6, 1),
            14,
            ClipPayload::Inline(data.clone()),
        )
        .unwrap();

        let locator = RawPayloadLocator::new(Arc::new(PanickingResolver));
        let payload = locator.locate(&clip).unwrap();

        assert_eq!(payload.as_bytes(), &data[..]);
        assert_eq!(payload.len(), data.len());
    }

    #[test]
    fn test_external_payload_window() {
        let blob: Vec<u8> = (0..64u8).collect();
        let resolver = Arc::new(InMemoryResourceResolver::new().with_file("sharedassets0.resS", blob));
        let locator = RawPayloadLocator::new(resolver.clone());

        let payload = locator
            .locate(&external_clip("sharedassets0.resS", 10, Some(6)))
            .unwrap();

        assert_eq!(payload.as_bytes(), &[10, 11, 12, 13, 14, 15]);
        assert_eq!(resolver.file("sharedassets0.resS").unwrap().read_count(), 1);
    }

    #[test]
    fn test_missing_resource_file() {
        let resolver = Arc::new(InMemoryResourceResolver::new().with_file("other.resS", vec![0u8; 8]));
        let locator = RawPayloadLocator::new(resolver.clone());

        let err = locator
            .locate(&external_clip("missing.resS", 0, Some(4)))
            .unwrap_err();

        assert!(matches!(err, LocatorError::ResourceNotFound { ref resource, .. } if resource == "missing.resS"));
        assert_eq!(resolver.file("other.resS").unwrap().read_count(), 0);
    }

    #[test]
    fn test_unknown_size_is_not_guessed() {
        let resolver = Arc::new(InMemoryResourceResolver::new().with_file("a.resS", vec![1u8; 32]));
        let locator = RawPayloadLocator::new(resolver.clone());

        let err = locator.locate(&external_clip("a.resS", 4, None)).unwrap_err();

        assert!(matches!(err, LocatorError::UnknownPayloadSize { .. }));
        assert_eq!(resolver.file("a.resS").unwrap().read_count(), 0);
    }

    #[test]
    fn test_truncated_resource_file() {
        let resolver = Arc::new(InMemoryResourceResolver::new().with_file("a.resS", vec![1u8; 8]));
        let locator = RawPayloadLocator::new(resolver);

        let err = locator.locate(&external_clip("a.resS", 4, Some(16))).unwrap_err();
        assert!(matches!(err, LocatorError::Read { .. }));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_corrupt_size_fails_the_clip_only() {
        let resolver = Arc::new(InMemoryResourceResolver::new().with_file("a.resS", vec![1u8; 8]));
        let locator = RawPayloadLocator::new(resolver.clone());

        let err = locator
            .locate(&external_clip("a.resS", 0, Some(u64::MAX / 2)))
            .unwrap_err();
        assert!(matches!(err, LocatorError::Read { ref resource, .. } if resource == "a.resS"));

        // The shared file stays usable for the next clip.
        let payload = locator.locate(&external_clip("a.resS", 2, Some(4))).unwrap();
        assert_eq!(payload.as_bytes(), &[1, 1, 1, 1]);
    }
}
