//! Service model documents used across tests.

use std::sync::Arc;
use svc_lib_rust::ServiceModel;

pub const TABLE_MODEL: &str = r#"{
  "metadata": {
    "apiVersion": "2012-08-10",
    "endpointPrefix": "dynamodb",
    "protocol": "json",
    "jsonVersion": "1.0",
    "targetPrefix": "DynamoDB_20120810",
    "serviceId": "DynamoDB"
  },
  "operations": {
    "GetItem": {
      "name": "GetItem",
      "http": {"method": "POST", "requestUri": "/"},
      "input": {"shape": "GetItemInput"},
      "output": {"shape": "GetItemOutput"}
    },
    "PutItem": {
      "name": "PutItem",
      "http": {"method": "POST", "requestUri": "/"},
      "input": {"shape": "PutItemInput"},
      "output": {"shape": "PutItemOutput"}
    },
    "Query": {
      "name": "Query",
      "http": {"method": "POST", "requestUri": "/"},
      "input": {"shape": "QueryInput"},
      "output": {"shape": "QueryOutput"}
    }
  },
  "shapes": {
    "GetItemInput": {"type": "structure", "members": {"TableName": {"shape": "String"}, "Key": {"shape": "Map"}}},
    "GetItemOutput": {"type": "structure", "members": {"Item": {"shape": "Map"}}},
    "PutItemInput": {"type": "structure", "members": {"TableName": {"shape": "String"}, "Item": {"shape": "Map"}}},
    "PutItemOutput": {"type": "structure", "members": {}},
    "QueryInput": {"type": "structure", "members": {"TableName": {"shape": "String"}}},
    "QueryOutput": {"type": "structure", "members": {"Items": {"shape": "List"}}},
    "String": {"type": "string"},
    "Map": {"type": "map"},
    "List": {"type": "list"}
  }
}"#;

pub const STORAGE_MODEL: &str = r#"{
  "metadata": {
    "apiVersion": "2006-03-01",
    "endpointPrefix": "storage",
    "protocol": "rest-json"
  },
  "operations": {
    "PutObject": {
      "http": {"method": "PUT", "requestUri": "/{Bucket}/{Key+}"},
      "input": {"shape": "PutObjectInput"},
      "output": {"shape": "PutObjectOutput"}
    },
    "GetObject": {
      "http": {"method": "GET", "requestUri": "/{Bucket}/{Key+}"},
      "input": {"shape": "GetObjectInput"},
      "output": {"shape": "GetObjectOutput"}
    }
  },
  "shapes": {
    "PutObjectInput": {
      "type": "structure",
      "members": {
        "Bucket": {"shape": "String", "location": "uri"},
        "Key": {"shape": "String", "location": "uri"},
        "Body": {"shape": "Blob"}
      },
      "payload": "Body"
    },
    "PutObjectOutput": {"type": "structure", "members": {"ETag": {"shape": "String"}}},
    "GetObjectInput": {
      "type": "structure",
      "members": {
        "Bucket": {"shape": "String", "location": "uri"},
        "Key": {"shape": "String", "location": "uri"},
        "Range": {"shape": "String", "location": "header", "locationName": "Range"}
      }
    },
    "GetObjectOutput": {
      "type": "structure",
      "members": {"Body": {"shape": "StreamingBlob"}},
      "payload": "Body"
    },
    "String": {"type": "string"},
    "Blob": {"type": "blob"},
    "StreamingBlob": {"type": "blob", "streaming": true}
  }
}"#;

pub fn table_model() -> Arc<ServiceModel> {
    Arc::new(ServiceModel::from_json_str(TABLE_MODEL).expect("table model parses"))
}

pub fn storage_model() -> Arc<ServiceModel> {
    Arc::new(ServiceModel::from_json_str(STORAGE_MODEL).expect("storage model parses"))
}
