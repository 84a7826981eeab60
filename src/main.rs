//! Replays the classic ERC20 approval front-running race end to end.
//!
//! The script mirrors the canonical attack: alice holds 5000 tokens and has
//! approved bob for 1000. She submits an approval lowering bob to 100; bob
//! sees it in the mempool and front-runs it with a pricier `transferFrom` of
//! the full 1000. Both mine in the same block, the transfer first, so bob
//! ends up with 1000 tokens *and* a fresh allowance of 100 to spend.
//!
//! # Usage
//! ```text
//! gasrace
//! ```
//!
//! Set `RUST_LOG=debug` to also see mempool activity.

use gasrace::core::transaction::Operation;
use gasrace::node::{Node, Submission};
use gasrace::types::address::Address;
use tracing::info;
use tracing_subscriber::EnvFilter;

const GWEI: u128 = 1_000_000_000;
const UNIT: u128 = 1_000_000_000_000_000_000;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let node = Node::new();
    let minter = Address::from_low_u64_be(0x1);
    let alice = Address::from_low_u64_be(0xa11ce);
    let bob = Address::from_low_u64_be(0xb0b);

    // Funding, mined immediately: alice holds 5000 and bob may spend 1000.
    submit(
        &node,
        minter,
        Operation::Mint {
            to: alice,
            amount: 5000 * UNIT,
        },
        GWEI,
    );
    submit(
        &node,
        alice,
        Operation::Approve {
            spender: bob,
            amount: 1000 * UNIT,
        },
        GWEI,
    );
    report_state(&node, alice, bob);

    // Hold submissions so both calls land in the same block.
    node.set_automine(false);

    submit(
        &node,
        alice,
        Operation::Approve {
            spender: bob,
            amount: 100 * UNIT,
        },
        100 * GWEI,
    );
    submit(
        &node,
        bob,
        Operation::TransferFrom {
            owner: alice,
            recipient: bob,
            amount: 1000 * UNIT,
        },
        200 * GWEI,
    );

    for tx in node.pending_transactions() {
        info!(
            "pending: id={} op={} gas_price={}",
            tx.id,
            tx.operation.name(),
            tx.gas_price
        );
    }

    let block = node.mine();
    for receipt in block.receipts.iter() {
        match receipt.revert_reason() {
            None => info!(
                "mined: id={} op={} -> applied",
                receipt.transaction.id,
                receipt.transaction.operation.name()
            ),
            Some(reason) => info!(
                "mined: id={} op={} -> reverted: {reason}",
                receipt.transaction.id,
                receipt.transaction.operation.name()
            ),
        }
    }
    report_state(&node, alice, bob);

    // bob still holds the overwritten allowance and drains it too.
    node.set_automine(true);
    submit(
        &node,
        bob,
        Operation::TransferFrom {
            owner: alice,
            recipient: bob,
            amount: 100 * UNIT,
        },
        200 * GWEI,
    );
    report_state(&node, alice, bob);

    info!(
        "done: {} blocks, supply intact at {}",
        node.height(),
        node.total_supply() / UNIT
    );
}

fn submit(node: &Node, sender: Address, operation: Operation, gas_price: u128) -> Submission {
    node.submit(sender, operation, gas_price, 150_000)
        .expect("demo submissions are well-formed")
}

fn report_state(node: &Node, alice: Address, bob: Address) {
    info!(
        "state: alice={} bob={} allowance(alice->bob)={}",
        node.balance_of(alice) / UNIT,
        node.balance_of(bob) / UNIT,
        node.allowance_of(alice, bob) / UNIT
    );
}
