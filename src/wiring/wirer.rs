//! ConnectionWirer - edge editing on a workflow version graph

use crate::error::{Result, WeftError};
use crate::graph::{Connection, PortRef, PrimitiveKind, WorkflowVersionGraph};

impl WorkflowVersionGraph {
    /// Append an edge `src/src_port -> dst/dst_port`
    pub fn connect(&mut self, src: &str, src_port: &str, dst: &str, dst_port: &str) {
        self.connections
            .push(Connection::new(src, src_port, dst, dst_port));
    }

    /// Remove exactly one matching edge
    ///
    /// Destinations without an embedded source id still match.
    pub fn disconnect(
        &mut self,
        src: &str,
        src_port: &str,
        dst: &str,
        dst_port: &str,
    ) -> Result<Connection> {
        let wanted = Connection::new(src, src_port, dst, dst_port);
        let position = self
            .connections
            .iter()
            .position(|conn| {
                conn.source == wanted.source
                    && conn.feeds(dst, dst_port)
                    && conn.destination.source().map_or(true, |embedded| embedded == src)
            })
            .ok_or_else(|| WeftError::ConnectionNotFound {
                source_id: wanted.source.to_string(),
                destination_id: wanted.destination.to_string(),
            })?;
        Ok(self.connections.remove(position))
    }

    /// Primitive ids feeding `dst.dst_port`, in connection order
    ///
    /// Includes primitive-shaped ids whose node is gone, so cleanup can
    /// report them.
    pub fn find_sources(&self, dst: &str, dst_port: &str) -> Vec<String> {
        self.suppliers(dst, dst_port)
            .into_iter()
            .filter(|src| self.is_literal_source(src))
            .map(str::to_string)
            .collect()
    }

    /// Non-literal suppliers of `dst.dst_port` (upstream node outputs)
    pub fn find_node_sources(&self, dst: &str, dst_port: &str) -> Vec<&str> {
        let mut suppliers = self.suppliers(dst, dst_port);
        suppliers.retain(|src| !self.is_literal_source(src));
        suppliers
    }

    /// Output port of the first edge `src -> dst.dst_port`
    pub fn source_port(&self, src: &str, dst: &str, dst_port: &str) -> Option<&str> {
        self.connections
            .iter()
            .find(|conn| conn.source.node() == src && conn.feeds(dst, dst_port))
            .map(|conn| conn.source.port())
    }

    /// Destinations fed by any output of `src`
    pub fn consumers<'a>(&'a self, src: &'a str) -> impl Iterator<Item = &'a PortRef> + 'a {
        self.connections
            .iter()
            .filter(move |conn| conn.source.node() == src)
            .map(|conn| &conn.destination)
    }

    fn is_literal_source(&self, id: &str) -> bool {
        if self.primitive_nodes.contains_key(id) {
            return true;
        }
        !self.nodes.contains_key(id)
            && PrimitiveKind::ALL.iter().any(|kind| kind.index_of(id).is_some())
    }

    /// Source node ids of every edge into `dst.dst_port`; borrows only the graph
    fn suppliers(&self, dst: &str, dst_port: &str) -> Vec<&str> {
        self.connections
            .iter()
            .filter(|conn| conn.feeds(dst, dst_port))
            .map(|conn| conn.source.node())
            .collect()
    }
}
