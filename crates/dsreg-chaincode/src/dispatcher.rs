//! Routes a function name plus ordered string arguments to the entity
//! stores.
//!
//! Structured arguments (versions, file lists, hash lists) arrive as one
//! JSON string each. Queries answer with a JSON payload; mutations answer
//! with an empty one. Failures carry only a message.

use std::ops::RangeInclusive;
use std::sync::Arc;

use dsreg_ledger::{EntityLedger, LedgerError};
use dsreg_store::KeyValueLedger;
use dsreg_types::validation::parse_file_size;
use dsreg_types::{DatasetFile, Version};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bootstrap;
use crate::config::ChaincodeConfig;
use crate::error::{ChaincodeError, ChaincodeResult};
use crate::response::Response;

const HELLO_PAYLOAD: &[u8] = b"hello world";

/// Every callable function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Function {
    Hello,
    CreateUser,
    ModifyUserName,
    QueryUser,
    QueryAllUsers,
    CreateFile,
    QueryFile,
    QueryFiles,
    CreateDataset,
    AddVersion,
    DeleteDataset,
    QueryDataset,
    QueryAllDatasets,
    QueryDatasetsByOwner,
    CreateRecord,
    QueryRecordsByUser,
    QueryRecordsByDataset,
}

impl Function {
    /// Resolve a function name, including the older aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "hello" => Self::Hello,
            "createUser" => Self::CreateUser,
            "modifyUserName" => Self::ModifyUserName,
            "queryUser" => Self::QueryUser,
            "queryAllUsers" | "queryUserList" => Self::QueryAllUsers,
            "createFile" => Self::CreateFile,
            "queryFile" => Self::QueryFile,
            "queryFiles" | "queryMultipleFiles" => Self::QueryFiles,
            "createDataset" => Self::CreateDataset,
            "addVersion" | "addDatasetVersion" | "appendDatasetVersion" => Self::AddVersion,
            "deleteDataset" => Self::DeleteDataset,
            "queryDataset" => Self::QueryDataset,
            "queryAllDatasets" => Self::QueryAllDatasets,
            "queryDatasetsByOwner" | "queryDatasetsByUser" | "queryDatasetList" => {
                Self::QueryDatasetsByOwner
            }
            "createRecord" | "createDownloadRecord" => Self::CreateRecord,
            "queryRecordsByUser" | "queryDownloadRecordListByUser" => Self::QueryRecordsByUser,
            "queryRecordsByDataset" | "queryDownloadRecordListByDataset" => {
                Self::QueryRecordsByDataset
            }
            _ => return None,
        })
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Hello => "hello",
            Self::CreateUser => "createUser",
            Self::ModifyUserName => "modifyUserName",
            Self::QueryUser => "queryUser",
            Self::QueryAllUsers => "queryAllUsers",
            Self::CreateFile => "createFile",
            Self::QueryFile => "queryFile",
            Self::QueryFiles => "queryFiles",
            Self::CreateDataset => "createDataset",
            Self::AddVersion => "addVersion",
            Self::DeleteDataset => "deleteDataset",
            Self::QueryDataset => "queryDataset",
            Self::QueryAllDatasets => "queryAllDatasets",
            Self::QueryDatasetsByOwner => "queryDatasetsByOwner",
            Self::CreateRecord => "createRecord",
            Self::QueryRecordsByUser => "queryRecordsByUser",
            Self::QueryRecordsByDataset => "queryRecordsByDataset",
        }
    }

    fn arity(self) -> RangeInclusive<usize> {
        match self {
            Self::Hello | Self::QueryAllUsers | Self::QueryAllDatasets => 0..=0,
            Self::QueryUser
            | Self::QueryFile
            | Self::QueryFiles
            | Self::QueryDatasetsByOwner
            | Self::QueryRecordsByUser => 1..=1,
            Self::CreateUser
            | Self::ModifyUserName
            | Self::CreateFile
            | Self::DeleteDataset
            | Self::QueryDataset
            | Self::QueryRecordsByDataset => 2..=2,
            Self::CreateDataset => 2..=3,
            Self::AddVersion => 3..=3,
            Self::CreateRecord => 5..=5,
        }
    }

    fn expected_args(self) -> String {
        match self.arity().into_inner() {
            (lo, hi) if lo == hi => lo.to_string(),
            (lo, hi) if hi == lo + 1 => format!("{lo} or {hi}"),
            (lo, hi) => format!("{lo} to {hi}"),
        }
    }

    fn check_arity(self, args: &[String]) -> ChaincodeResult<()> {
        if self.arity().contains(&args.len()) {
            Ok(())
        } else {
            Err(ChaincodeError::ArgumentCount {
                function: self.name(),
                expected: self.expected_args(),
                actual: args.len(),
            })
        }
    }
}

/// The invocation entry point over one key/value ledger handle.
pub struct Chaincode<L: ?Sized> {
    ledger: EntityLedger<L>,
    config: ChaincodeConfig,
}

impl<L: KeyValueLedger + ?Sized> Chaincode<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self::with_config(ledger, ChaincodeConfig::default())
    }

    pub fn with_config(ledger: Arc<L>, config: ChaincodeConfig) -> Self {
        Self {
            ledger: EntityLedger::with_config(ledger, config.ledger.clone()),
            config,
        }
    }

    pub fn ledger(&self) -> &EntityLedger<L> {
        &self.ledger
    }

    /// Seed the configured users.
    pub fn init(&self) -> Response {
        match bootstrap::init(&self.ledger, &self.config.seed_users) {
            Ok(_) => Response::success(Vec::new()),
            Err(e) => {
                warn!(error = %e, "init failed");
                Response::error(format!("init: {e}"))
            }
        }
    }

    pub fn invoke(&self, function: &str, args: &[String]) -> Response {
        info!(function, args = args.len(), "invoke");
        match self.dispatch(function, args) {
            Ok(payload) => {
                debug!(function, bytes = payload.len(), "invoke succeeded");
                Response::success(payload)
            }
            Err(e) => {
                warn!(function, error = %e, "invoke failed");
                Response::error(e.to_string())
            }
        }
    }

    fn dispatch(&self, name: &str, args: &[String]) -> ChaincodeResult<Vec<u8>> {
        let function = Function::from_name(name)
            .ok_or_else(|| ChaincodeError::UnknownFunction(name.to_string()))?;
        function.check_arity(args)?;

        let users = self.ledger.users();
        let files = self.ledger.files();
        let datasets = self.ledger.datasets();
        let records = self.ledger.records();

        match function {
            Function::Hello => Ok(HELLO_PAYLOAD.to_vec()),

            Function::CreateUser => {
                users.create_user(&args[0], &args[1])?;
                Ok(Vec::new())
            }
            Function::ModifyUserName => {
                users.modify_user_name(&args[0], &args[1])?;
                Ok(Vec::new())
            }
            Function::QueryUser => encode(function, &users.query_user(&args[0])?),
            Function::QueryAllUsers => encode(function, &users.query_all_users()?),

            Function::CreateFile => {
                let size = parse_file_size(&args[1]).map_err(LedgerError::from)?;
                files.create_file(&args[0], size)?;
                Ok(Vec::new())
            }
            Function::QueryFile => encode(function, &files.query_file(&args[0])?),
            Function::QueryFiles => {
                let hashes: Vec<String> = decode(function, "hash list", &args[0])?;
                encode(function, &files.query_files(hashes.as_slice())?)
            }

            Function::CreateDataset => {
                let versions: Vec<Version> = match args.get(2) {
                    Some(json) => decode(function, "version list", json)?,
                    None => Vec::new(),
                };
                datasets.create_dataset(&args[0], &args[1], versions)?;
                Ok(Vec::new())
            }
            Function::AddVersion => {
                let version: Version = decode(function, "version", &args[2])?;
                datasets.add_version(&args[0], &args[1], version)?;
                Ok(Vec::new())
            }
            Function::DeleteDataset => {
                datasets.delete_dataset(&args[0], &args[1])?;
                Ok(Vec::new())
            }
            Function::QueryDataset => encode(function, &datasets.query_dataset(&args[0], &args[1])?),
            Function::QueryAllDatasets => encode(function, &datasets.query_all_datasets()?),
            Function::QueryDatasetsByOwner => {
                encode(function, &datasets.query_datasets_by_owner(&args[0])?)
            }

            Function::CreateRecord => {
                let record_files: Vec<DatasetFile> = decode(function, "file list", &args[3])?;
                records.create_record(&args[0], &args[1], &args[2], record_files, &args[4])?;
                Ok(Vec::new())
            }
            Function::QueryRecordsByUser => {
                encode(function, &records.query_records_by_user(&args[0])?)
            }
            Function::QueryRecordsByDataset => encode(
                function,
                &records.query_records_by_dataset(&args[0], &args[1])?,
            ),
        }
    }
}

fn decode<T: DeserializeOwned>(
    function: Function,
    argument: &'static str,
    json: &str,
) -> ChaincodeResult<T> {
    serde_json::from_str(json).map_err(|source| ChaincodeError::Json {
        function: function.name(),
        argument,
        source,
    })
}

fn encode<T: Serialize>(function: Function, value: &T) -> ChaincodeResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|source| ChaincodeError::Encode {
        function: function.name(),
        source,
    })
}
