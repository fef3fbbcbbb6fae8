//! Consensus-main contract bindings.
//!
//! Writes to an intelligent contract are not sent to the contract itself;
//! they are submitted to the consensus-main contract, which schedules them
//! for validator execution.

use alloy::{
    primitives::{Address, Bytes, U256},
    sol,
    sol_types::SolCall,
};

use crate::genlayer::constants::{DEFAULT_MAX_ROTATIONS, DEFAULT_NUM_OF_INITIAL_VALIDATORS};

sol! {
    interface IConsensusMain {
        function addTransaction(
            address sender,
            address recipient,
            uint256 numOfInitialValidators,
            uint256 maxRotations,
            bytes txData
        ) external payable;
    }
}

/// ABI-encode the `addTransaction` call that submits `calldata` to `recipient`.
pub fn encode_add_transaction(sender: Address, recipient: Address, calldata: Vec<u8>) -> Bytes {
    let call = IConsensusMain::addTransactionCall {
        sender,
        recipient,
        numOfInitialValidators: U256::from(DEFAULT_NUM_OF_INITIAL_VALIDATORS),
        maxRotations: U256::from(DEFAULT_MAX_ROTATIONS),
        txData: Bytes::from(calldata),
    };
    Bytes::from(call.abi_encode())
}
