//! Canned documents shared by the workspace tests.

/// Document/literal service description for `getData`, with a generated
/// service name, an internal SOAP address and an operation without messages.
pub const GET_DATA_WSDL: &str = include_str!("../fixtures/get_data.wsdl");

/// Service description whose `Node` type refers to itself.
pub const RECURSIVE_WSDL: &str = include_str!("../fixtures/recursive.wsdl");

/// Service description whose global elements refer to each other by `ref`.
pub const ELEMENT_REF_CYCLE_WSDL: &str = include_str!("../fixtures/element_ref_cycle.wsdl");

/// `getData` response echoing server-only header fields.
pub const GET_DATA_RESPONSE: &str = include_str!("../fixtures/get_data_response.xml");

/// A SOAP fault.
pub const FAULT_RESPONSE: &str = include_str!("../fixtures/fault.xml");

/// `listMethods` response advertising two services.
pub const LIST_METHODS_RESPONSE: &str = include_str!("../fixtures/list_methods_response.xml");
