use crate::config::S3Config;
use crate::storage::{object_key, BlobStorage};
use async_trait::async_trait;
use rusoto_core::{Region, RusotoError};
use rusoto_s3::{PutObjectError, PutObjectOutput, PutObjectRequest, S3Client, S3};

pub struct S3Bucket {
    s3: S3Client,
    bucket_name: String,
    pub pub_url: String,
}

impl S3Bucket {
    pub fn new(region: Region, bucket_name: String, pub_url: String) -> S3Bucket {
        log::info!("Initializing new S3 Bucket.");

        S3Bucket {
            s3: S3Client::new(region),
            bucket_name,
            pub_url,
        }
    }

    /// Credentials come from the default AWS provider chain.
    pub fn from_config(config: &S3Config) -> anyhow::Result<S3Bucket> {
        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                name: config.region.to_owned(),
                endpoint: endpoint.to_owned(),
            },
            None => config.region.parse::<Region>()?,
        };

        Ok(Self::new(
            region,
            config.bucket.to_owned(),
            config.public_url.to_owned(),
        ))
    }

    pub async fn put_object(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> Result<PutObjectOutput, RusotoError<PutObjectError>> {
        log::info!("S3Bucket: put_object: {}", key);

        let put_request = PutObjectRequest {
            bucket: self.bucket_name.to_owned(),
            key: key.to_owned(),
            content_length: Some(data.len() as i64),
            content_type: Some(content_type.to_owned()),
            body: Some(data.into()),
            ..Default::default()
        };

        self.s3.put_object(put_request).await
    }
}

#[async_trait]
impl BlobStorage for S3Bucket {
    async fn put(
        &self,
        file_name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> anyhow::Result<String> {
        let key = object_key(file_name);
        self.put_object(data, &key, content_type).await?;
        Ok(format!("{}/{}", self.pub_url, key))
    }
}
