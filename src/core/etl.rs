use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        let name = self.pipeline.name();
        let started = Instant::now();
        tracing::info!("🚀 Starting job: {}", name);

        tracing::info!("📥 Extracting...");
        let raw_data = self.pipeline.extract().await?;

        tracing::info!("🔄 Transforming...");
        let report = self.pipeline.transform(raw_data).await?;

        tracing::info!("💾 Loading...");
        let output_path = self.pipeline.load(report).await?;

        tracing::info!("✅ Job {} finished in {:.2?}", name, started.elapsed());
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::EtlError;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    struct MockPipeline {
        fail_extract: bool,
        loaded: Arc<Mutex<Vec<u32>>>,
    }

    #[async_trait::async_trait]
    impl Pipeline for MockPipeline {
        type Extracted = Vec<u32>;
        type Report = u32;

        fn name(&self) -> &str {
            "mock"
        }

        async fn extract(&self) -> Result<Vec<u32>> {
            if self.fail_extract {
                return Err(EtlError::HttpStatusError {
                    status: 500,
                    url: "http://localhost/mock".to_string(),
                    body: "extract failed".to_string(),
                });
            }
            Ok(vec![1, 2, 3])
        }

        async fn transform(&self, data: Vec<u32>) -> Result<u32> {
            Ok(data.iter().sum())
        }

        async fn load(&self, report: u32) -> Result<String> {
            self.loaded.lock().await.push(report);
            Ok("mock.json".to_string())
        }
    }

    #[tokio::test]
    async fn test_run_executes_all_phases() {
        let loaded = Arc::new(Mutex::new(Vec::new()));
        let engine = EtlEngine::new(MockPipeline {
            fail_extract: false,
            loaded: loaded.clone(),
        });

        let output = engine.run().await.unwrap();

        assert_eq!(output, "mock.json");
        assert_eq!(*loaded.lock().await, vec![6]);
    }

    #[tokio::test]
    async fn test_run_stops_on_extract_error() {
        let loaded = Arc::new(Mutex::new(Vec::new()));
        let engine = EtlEngine::new(MockPipeline {
            fail_extract: true,
            loaded: loaded.clone(),
        });

        assert!(engine.run().await.is_err());
        assert!(loaded.lock().await.is_empty());
    }
}
