//! Protocol Buffer types of the `localnetv1` watch API, generated from
//! `proto/localnetv1.proto` at build time.

tonic::include_proto!("localnetv1");

mod ext;
